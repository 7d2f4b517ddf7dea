//! Environment-driven configuration for the bridge.
//!
//! Every setting is resolved through the same precedence: an explicit
//! process-level override, then the environment variable of the same
//! name, then a hardcoded default. Values are trimmed and empty values
//! count as absent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use aletheia_client::{DeliveryAuth, DeliveryConfig, TokenProvider};

/// Collector endpoint URL.
pub const COLLECTOR_URL: &str = "AUDIT_COLLECTOR_URL";

/// Authentication type: `none`, `basic`, `bearer` or `dynamic`.
pub const AUTH_TYPE: &str = "AUDIT_AUTH_TYPE";

/// Username for basic auth.
pub const AUTH_USERNAME: &str = "AUDIT_AUTH_USERNAME";

/// Password for basic auth.
pub const AUTH_PASSWORD: &str = "AUDIT_AUTH_PASSWORD";

/// Static token for bearer auth.
pub const AUTH_TOKEN: &str = "AUDIT_AUTH_TOKEN";

/// Enable processing of administrative events.
pub const ADMIN_EVENTS_ENABLED: &str = "AUDIT_ADMIN_EVENTS_ENABLED";

/// Enable background delivery.
pub const ASYNC_ENABLED: &str = "AUDIT_ASYNC_ENABLED";

/// Enable debug dumps of raw events and generated records.
pub const DEBUG_ENABLED: &str = "AUDIT_DEBUG_ENABLED";

const DEFAULT_COLLECTOR_URL: &str = "http://localhost:8080/fhir";
const DEFAULT_AUTH_TYPE: &str = "none";
const DEFAULT_ADMIN_EVENTS_ENABLED: bool = false;
const DEFAULT_ASYNC_ENABLED: bool = true;
const DEFAULT_DEBUG_ENABLED: bool = false;

/// Bridge configuration resolved from overrides and the environment.
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    overrides: HashMap<String, String>,
}

impl BridgeConfig {
    /// Creates a configuration that reads from the environment only.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Sets a process-level override for a key. Overrides win over the
    /// environment.
    #[must_use]
    pub fn with_override(mut self, key: &str, value: &str) -> Self {
        self.overrides.insert(key.to_string(), value.to_string());
        self
    }

    /// Resolves a string value for a key.
    #[must_use]
    pub fn get(&self, key: &str, default: &str) -> String {
        self.overrides
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| {
                std::env::var(key)
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| default.to_string())
    }

    /// Resolves a boolean value for a key. Only a case-insensitive
    /// `true` enables the flag; anything else disables it.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let value = self.get(key, "");
        if value.is_empty() {
            default
        } else {
            value.eq_ignore_ascii_case("true")
        }
    }

    /// Configured collector URL.
    #[must_use]
    pub fn collector_url(&self) -> String {
        self.get(COLLECTOR_URL, DEFAULT_COLLECTOR_URL)
    }

    /// Configured authentication type, lowercased.
    #[must_use]
    pub fn auth_type(&self) -> String {
        self.get(AUTH_TYPE, DEFAULT_AUTH_TYPE).to_lowercase()
    }

    /// Whether administrative events are processed.
    #[must_use]
    pub fn admin_events_enabled(&self) -> bool {
        self.get_bool(ADMIN_EVENTS_ENABLED, DEFAULT_ADMIN_EVENTS_ENABLED)
    }

    /// Whether deliveries run on the background worker pool.
    #[must_use]
    pub fn async_enabled(&self) -> bool {
        self.get_bool(ASYNC_ENABLED, DEFAULT_ASYNC_ENABLED)
    }

    /// Whether debug event dumps are enabled.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.get_bool(DEBUG_ENABLED, DEFAULT_DEBUG_ENABLED)
    }

    /// Builds the delivery configuration for the configured auth type.
    ///
    /// `dynamic` auth needs a token-minting collaborator; when none is
    /// supplied the client falls back to unauthenticated delivery with a
    /// warning.
    #[must_use]
    pub fn delivery_config(&self, token_provider: Option<Arc<dyn TokenProvider>>) -> DeliveryConfig {
        let auth = match self.auth_type().as_str() {
            "basic" => DeliveryAuth::basic(
                self.get(AUTH_USERNAME, ""),
                self.get(AUTH_PASSWORD, ""),
            ),
            "bearer" => DeliveryAuth::bearer(self.get(AUTH_TOKEN, "")),
            "dynamic" => token_provider.map_or_else(
                || {
                    warn!("Dynamic auth configured but no token provider supplied");
                    DeliveryAuth::None
                },
                DeliveryAuth::dynamic,
            ),
            "none" => DeliveryAuth::None,
            other => {
                warn!(auth_type = other, "Unknown auth type, using none");
                DeliveryAuth::None
            }
        };

        DeliveryConfig::new(self.collector_url())
            .with_auth(auth)
            .with_async_enabled(self.async_enabled())
    }
}
