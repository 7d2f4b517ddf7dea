//! HTTP delivery of audit records to the collector endpoint.

use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use aletheia_builder::AuditRecord;

use crate::config::{DeliveryAuth, DeliveryConfig};
use crate::error::DeliveryError;

/// FHIR JSON media type, used for both `Content-Type` and `Accept`.
const FHIR_JSON_MEDIA_TYPE: &str = "application/fhir+json";

/// Client for delivering audit records to a FHIR collector.
///
/// In async mode (the default) records are handed to a small fixed pool
/// of background workers and `send` returns immediately; failed attempts
/// are logged and the record is dropped. In sync mode `send` delivers
/// inline but still swallows errors; use [`DeliveryClient::send_sync`]
/// to observe failures.
///
/// Workers are detached tasks: they never block process shutdown, and
/// work still queued when the runtime stops is lost (an accepted loss
/// window — this client keeps no durable state).
#[derive(Debug)]
pub struct DeliveryClient {
    inner: Arc<Inner>,
    sender: Mutex<Option<mpsc::Sender<AuditRecord>>>,
}

#[derive(Debug)]
struct Inner {
    url: String,
    auth: DeliveryAuth,
    http: reqwest::Client,
}

impl DeliveryClient {
    /// Creates a new delivery client.
    ///
    /// When async mode is enabled this spawns the worker pool, so the
    /// client must be constructed inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector URL is invalid or the HTTP
    /// client cannot be created.
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        url::Url::parse(&config.url).map_err(|source| DeliveryError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        // The URL is the complete endpoint; trim a single trailing slash.
        let url = config
            .url
            .strip_suffix('/')
            .unwrap_or(&config.url)
            .to_string();

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| DeliveryError::ClientBuild { source })?;

        let inner = Arc::new(Inner {
            url,
            auth: config.auth.clone(),
            http,
        });

        let sender = if config.async_enabled {
            Some(Self::spawn_workers(
                &inner,
                config.worker_count,
                config.queue_capacity,
            ))
        } else {
            None
        };

        info!(
            url = %inner.url,
            auth = auth_label(&inner.auth),
            async_enabled = config.async_enabled,
            "Delivery client initialized"
        );

        Ok(Self {
            inner,
            sender: Mutex::new(sender),
        })
    }

    /// Returns the configured collector URL (trailing slash trimmed).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Sends an audit record, honoring the configured async mode.
    ///
    /// An absent record is logged and skipped. Failures never surface to
    /// the caller; they are logged and the record is dropped.
    pub async fn send(&self, record: Option<AuditRecord>) {
        let Some(record) = record else {
            warn!("Received absent audit record, skipping");
            return;
        };

        let sender = self.sender.lock().expect("sender lock poisoned").clone();
        if let Some(sender) = sender {
            match sender.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    error!("Dispatch queue full, dropping audit record");
                }
                Err(TrySendError::Closed(_)) => {
                    warn!("Delivery client closed, dropping audit record");
                }
            }
        } else if let Err(e) = self.inner.dispatch(&record).await {
            error!(error = %e, "Failed to deliver audit record");
        }
    }

    /// Delivers an audit record inline, propagating transport failures.
    ///
    /// A completed request with a non-2xx status is logged and reported
    /// as success here; only serialization and transport errors surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or the request
    /// cannot be completed.
    pub async fn send_sync(&self, record: &AuditRecord) -> Result<(), DeliveryError> {
        self.inner.dispatch(record).await
    }

    /// Stops accepting new async work. Idempotent.
    ///
    /// Already-queued records are drained best-effort by the workers;
    /// in-flight attempts are not awaited.
    pub fn close(&self) {
        if self
            .sender
            .lock()
            .expect("sender lock poisoned")
            .take()
            .is_some()
        {
            debug!("Delivery client closed");
        }
    }

    /// Spawns the background worker pool over a bounded queue.
    fn spawn_workers(
        inner: &Arc<Inner>,
        worker_count: usize,
        queue_capacity: usize,
    ) -> mpsc::Sender<AuditRecord> {
        let (sender, receiver) = mpsc::channel::<AuditRecord>(queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        for worker in 0..worker_count {
            let inner = Arc::clone(inner);
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                loop {
                    let record = receiver.lock().await.recv().await;
                    match record {
                        Some(record) => {
                            if let Err(e) = inner.dispatch(&record).await {
                                error!(worker, error = %e, "Async delivery failed");
                            }
                        }
                        None => break,
                    }
                }
                debug!(worker, "Delivery worker stopped");
            });
        }

        sender
    }
}

impl Inner {
    /// Serializes and POSTs one record to the collector.
    async fn dispatch(&self, record: &AuditRecord) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(record)?;
        debug!(url = %self.url, "Sending audit record");

        let mut request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, FHIR_JSON_MEDIA_TYPE)
            .header(ACCEPT, FHIR_JSON_MEDIA_TYPE)
            .body(body);

        if let Some(header) = self.auth_header() {
            request = request.header(AUTHORIZATION, header);
        }

        let response = request
            .send()
            .await
            .map_err(|source| DeliveryError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            info!(status = status.as_u16(), "Audit record delivered");
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Collector rejected audit record");
        }

        Ok(())
    }

    /// Computes the `Authorization` header per the configured strategy.
    ///
    /// Misconfigured static credentials and failed dynamic minting omit
    /// the header with a warning; the request is still attempted and the
    /// collector decides.
    fn auth_header(&self) -> Option<String> {
        match &self.auth {
            DeliveryAuth::None => None,
            DeliveryAuth::Basic { username, password } => {
                if username.is_empty() {
                    warn!("Basic auth configured without a username");
                    return None;
                }
                let credentials = BASE64.encode(format!("{username}:{password}"));
                Some(format!("Basic {credentials}"))
            }
            DeliveryAuth::Bearer { token } => {
                if token.is_empty() {
                    warn!("Bearer auth configured without a token");
                    return None;
                }
                Some(format!("Bearer {token}"))
            }
            DeliveryAuth::Dynamic { provider } => match provider.bearer_token() {
                Some(token) if !token.is_empty() => Some(format!("Bearer {token}")),
                _ => {
                    warn!("Token minting failed, sending without credentials");
                    None
                }
            },
        }
    }
}

fn auth_label(auth: &DeliveryAuth) -> &'static str {
    match auth {
        DeliveryAuth::None => "none",
        DeliveryAuth::Basic { .. } => "basic",
        DeliveryAuth::Bearer { .. } => "bearer",
        DeliveryAuth::Dynamic { .. } => "dynamic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenProvider;
    use aletheia_builder::{
        Agent, CodeableConcept, Coding, Identifier, Observer, Reference, Source,
    };
    use std::time::Duration;

    fn test_record() -> AuditRecord {
        AuditRecord {
            resource_type: "AuditEvent".to_string(),
            id: "test-id-123".to_string(),
            record_type: Coding::new("sys", "110114", "User Authentication"),
            subtype: None,
            action: "E".to_string(),
            recorded: "2023-11-14T22:13:20Z".to_string(),
            outcome: "0".to_string(),
            outcome_desc: None,
            agent: vec![Agent {
                agent_type: CodeableConcept {
                    coding: vec![Coding::new("role", "humanuser", "human user")],
                },
                who: Reference {
                    identifier: Identifier {
                        system: "sys/users".to_string(),
                        value: "john".to_string(),
                    },
                },
                alt_id: None,
                requestor: true,
                network: None,
            }],
            source: Source {
                site: "test-realm".to_string(),
                observer: Observer {
                    display: "Aletheia".to_string(),
                    identifier: Identifier {
                        system: "sys/realm".to_string(),
                        value: "test-realm".to_string(),
                    },
                },
                source_type: vec![Coding::new("src", "6", "Security Server")],
            },
            entity: None,
        }
    }

    fn sync_client(url: &str, auth: DeliveryAuth) -> DeliveryClient {
        DeliveryClient::new(
            DeliveryConfig::new(url)
                .with_auth(auth)
                .with_async_enabled(false)
                .with_connect_timeout(Duration::from_secs(1))
                .with_request_timeout(Duration::from_secs(2)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_absent_record_is_a_no_op() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::None);
        // Returns immediately without touching the network; an actual
        // attempt against this endpoint would fail loudly.
        client.send(None).await;
        client.close();
    }

    #[tokio::test]
    async fn test_send_swallows_transport_errors() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::None);
        client.send(Some(test_record())).await;
        client.close();
    }

    #[tokio::test]
    async fn test_send_sync_propagates_transport_errors() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::None);
        let result = client.send_sync(&test_record()).await;
        assert!(matches!(result, Err(DeliveryError::Request { .. })));
    }

    #[tokio::test]
    async fn test_async_send_returns_immediately() {
        let client = DeliveryClient::new(
            DeliveryConfig::new("http://127.0.0.1:1/fhir")
                .with_connect_timeout(Duration::from_secs(1)),
        )
        .unwrap();

        client.send(Some(test_record())).await;
        client.close();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let client = DeliveryClient::new(DeliveryConfig::new("http://127.0.0.1:1/fhir")).unwrap();
        client.close();
        client.close();
    }

    #[tokio::test]
    async fn test_send_after_close_drops_record() {
        let client = DeliveryClient::new(DeliveryConfig::new("http://127.0.0.1:1/fhir")).unwrap();
        client.close();
        // Logged and dropped, never an error.
        client.send(Some(test_record())).await;
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = DeliveryClient::new(
            DeliveryConfig::new("not a url").with_async_enabled(false),
        );
        assert!(matches!(result, Err(DeliveryError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let client = sync_client("http://127.0.0.1:1/fhir/", DeliveryAuth::None);
        assert_eq!(client.url(), "http://127.0.0.1:1/fhir");

        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::None);
        assert_eq!(client.url(), "http://127.0.0.1:1/fhir");
    }

    #[tokio::test]
    async fn test_auth_header_none() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::None);
        assert!(client.inner.auth_header().is_none());
    }

    #[tokio::test]
    async fn test_auth_header_basic() {
        let client = sync_client(
            "http://127.0.0.1:1/fhir",
            DeliveryAuth::basic("testuser", "testpass"),
        );

        let header = client.inner.auth_header().unwrap();
        let expected = BASE64.encode("testuser:testpass");
        assert_eq!(header, format!("Basic {expected}"));
    }

    #[tokio::test]
    async fn test_auth_header_basic_without_username_omitted() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::basic("", "pass"));
        assert!(client.inner.auth_header().is_none());
    }

    #[tokio::test]
    async fn test_auth_header_bearer() {
        let client = sync_client(
            "http://127.0.0.1:1/fhir",
            DeliveryAuth::bearer("test-token-12345"),
        );
        assert_eq!(
            client.inner.auth_header().as_deref(),
            Some("Bearer test-token-12345")
        );
    }

    #[tokio::test]
    async fn test_auth_header_bearer_empty_omitted() {
        let client = sync_client("http://127.0.0.1:1/fhir", DeliveryAuth::bearer(""));
        assert!(client.inner.auth_header().is_none());
    }

    #[derive(Debug)]
    struct CountingProvider(std::sync::atomic::AtomicUsize);

    impl TokenProvider for CountingProvider {
        fn bearer_token(&self) -> Option<String> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Some(format!("minted-{n}"))
        }
    }

    #[tokio::test]
    async fn test_auth_header_dynamic_mints_per_request() {
        let provider = Arc::new(CountingProvider(std::sync::atomic::AtomicUsize::new(0)));
        let client = sync_client(
            "http://127.0.0.1:1/fhir",
            DeliveryAuth::dynamic(Arc::clone(&provider) as Arc<dyn TokenProvider>),
        );

        assert_eq!(client.inner.auth_header().as_deref(), Some("Bearer minted-0"));
        assert_eq!(client.inner.auth_header().as_deref(), Some("Bearer minted-1"));
    }

    #[derive(Debug)]
    struct FailingProvider;

    impl TokenProvider for FailingProvider {
        fn bearer_token(&self) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_auth_header_dynamic_minting_failure_omitted() {
        let client = sync_client(
            "http://127.0.0.1:1/fhir",
            DeliveryAuth::dynamic(Arc::new(FailingProvider)),
        );
        assert!(client.inner.auth_header().is_none());
    }
}
