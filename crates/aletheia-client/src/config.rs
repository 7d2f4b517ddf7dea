//! Configuration types for the delivery client.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Mints a short-lived bearer credential on demand.
///
/// Implementations are backed by the host's own signing keys and are
/// opaque to the client; a fresh token is requested for every delivery.
pub trait TokenProvider: Send + Sync + Debug {
    /// Returns a bearer token, or `None` when minting fails.
    fn bearer_token(&self) -> Option<String>;
}

/// Authentication strategies for collector access.
#[derive(Debug, Clone)]
pub enum DeliveryAuth {
    /// No authentication.
    None,

    /// Basic authentication (username/password).
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    /// Static bearer token authentication.
    Bearer {
        /// Token value.
        token: String,
    },

    /// Per-request token minting through a host collaborator.
    Dynamic {
        /// Token-minting collaborator.
        provider: Arc<dyn TokenProvider>,
    },
}

impl DeliveryAuth {
    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates static bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Creates dynamic per-request authentication.
    #[must_use]
    pub fn dynamic(provider: Arc<dyn TokenProvider>) -> Self {
        Self::Dynamic { provider }
    }
}

/// Configuration for the delivery client.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Collector endpoint URL. Treated as the complete endpoint; no path
    /// is appended, and a single trailing `/` is trimmed.
    pub url: String,

    /// Authentication strategy.
    pub auth: DeliveryAuth,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Total request timeout.
    pub request_timeout: Duration,

    /// Whether deliveries run on the background worker pool.
    pub async_enabled: bool,

    /// Number of background delivery workers.
    pub worker_count: usize,

    /// Capacity of the dispatch queue; overflow drops records.
    pub queue_capacity: usize,

    /// User agent string.
    pub user_agent: String,
}

impl DeliveryConfig {
    /// Creates a new configuration with the given collector URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use aletheia_client::DeliveryConfig;
    ///
    /// let config = DeliveryConfig::new("https://collector.example.com/fhir");
    /// assert_eq!(config.url, "https://collector.example.com/fhir");
    /// assert!(config.async_enabled);
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: DeliveryAuth::None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            async_enabled: true,
            worker_count: 4,
            queue_capacity: 256,
            user_agent: format!("aletheia-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authentication strategy.
    #[must_use]
    pub fn with_auth(mut self, auth: DeliveryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the total request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enables or disables background delivery.
    #[must_use]
    pub const fn with_async_enabled(mut self, enabled: bool) -> Self {
        self.async_enabled = enabled;
        self
    }

    /// Sets the background worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets the dispatch queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
