//! Orchestrates the extract → build → send pipeline for host events.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use aletheia_builder::{AuditRecordBuilder, EventExtractor};
use aletheia_client::{DeliveryClient, DeliveryError, TokenProvider};
use aletheia_core::{AdminEvent, MappingTable, SubjectEvent, UserLookup};

use crate::config::BridgeConfig;

/// Runs host events through the audit pipeline.
///
/// Every failure mode inside the pipeline is contained here: unsupported
/// events are skipped, build and delivery problems are logged, and no
/// error ever reaches the host's event loop.
#[derive(Debug)]
pub struct AuditBridge {
    extractor: EventExtractor,
    builder: AuditRecordBuilder,
    client: DeliveryClient,
    admin_events_enabled: bool,
    debug_enabled: bool,
}

impl AuditBridge {
    /// Creates a builder for the bridge.
    #[must_use]
    pub fn builder(config: BridgeConfig) -> AuditBridgeBuilder {
        AuditBridgeBuilder::new(config)
    }

    /// Handles a subject event from the host.
    ///
    /// Absent and unsupported events are skipped with a log line.
    pub async fn on_subject_event(&self, event: Option<&SubjectEvent>) {
        let Some(event) = event else {
            warn!("Received absent subject event");
            return;
        };

        debug!(
            event_type = event.event_type.as_deref(),
            user_id = event.user_id.as_deref(),
            realm_id = event.realm_id.as_deref(),
            "Processing subject event"
        );
        if self.debug_enabled {
            log_debug_json("Raw subject event", event);
        }

        let Some(normalized) = self.extractor.extract_subject_event(Some(event)) else {
            debug!(
                event_type = event.event_type.as_deref(),
                "Event type not supported for audit conversion"
            );
            return;
        };

        let Some(record) = self.builder.build(Some(&normalized)) else {
            warn!(event_type = %normalized.event_type, "Failed to build audit record");
            return;
        };
        if self.debug_enabled {
            log_debug_json("Generated audit record", &record);
        }

        self.client.send(Some(record)).await;

        info!(
            event_type = %normalized.event_type,
            user_id = normalized.user_id.as_deref(),
            realm_id = %normalized.realm_id,
            "Processed subject event"
        );
    }

    /// Handles an administrative event from the host.
    ///
    /// Skipped entirely unless admin event processing is enabled.
    pub async fn on_admin_event(&self, event: Option<&AdminEvent>) {
        let Some(event) = event else {
            warn!("Received absent admin event");
            return;
        };

        if !self.admin_events_enabled {
            debug!(
                operation_type = event.operation_type.as_deref(),
                "Admin events disabled, skipping"
            );
            return;
        }

        debug!(
            operation_type = event.operation_type.as_deref(),
            resource_path = event.resource_path.as_deref(),
            realm_id = event.realm_id.as_deref(),
            "Processing admin event"
        );
        if self.debug_enabled {
            log_debug_json("Raw admin event", event);
        }

        let Some(normalized) = self.extractor.extract_admin_event(Some(event)) else {
            warn!("Failed to extract admin event data");
            return;
        };

        let Some(record) = self.builder.build(Some(&normalized)) else {
            warn!(event_type = %normalized.event_type, "Failed to build audit record");
            return;
        };
        if self.debug_enabled {
            log_debug_json("Generated audit record", &record);
        }

        self.client.send(Some(record)).await;

        info!(
            event_type = %normalized.event_type,
            resource_path = event.resource_path.as_deref(),
            realm_id = %normalized.realm_id,
            "Processed admin event"
        );
    }

    /// Releases the delivery client. Idempotent.
    pub fn close(&self) {
        debug!("Closing audit bridge");
        self.client.close();
    }
}

/// Builder wiring collaborators into an [`AuditBridge`].
#[derive(Debug)]
pub struct AuditBridgeBuilder {
    config: BridgeConfig,
    mapping: Option<Arc<MappingTable>>,
    lookup: Option<Arc<dyn UserLookup>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl AuditBridgeBuilder {
    /// Creates a builder from a resolved configuration.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            mapping: None,
            lookup: None,
            token_provider: None,
        }
    }

    /// Supplies a pre-built mapping table instead of the embedded one.
    #[must_use]
    pub fn with_mapping_table(mut self, mapping: Arc<MappingTable>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Attaches the host user-store lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: Arc<dyn UserLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Attaches the host token-minting collaborator for `dynamic` auth.
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Builds the bridge.
    ///
    /// With background delivery enabled this spawns the client's worker
    /// pool, so it must run inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the delivery client cannot be constructed.
    pub fn build(self) -> Result<AuditBridge, DeliveryError> {
        let mapping = self
            .mapping
            .unwrap_or_else(|| Arc::new(MappingTable::load()));

        let mut extractor = EventExtractor::new(Arc::clone(&mapping));
        if let Some(lookup) = self.lookup {
            extractor = extractor.with_lookup(lookup);
        }

        let client = DeliveryClient::new(self.config.delivery_config(self.token_provider))?;

        let bridge = AuditBridge {
            extractor,
            builder: AuditRecordBuilder::new(mapping),
            client,
            admin_events_enabled: self.config.admin_events_enabled(),
            debug_enabled: self.config.debug_enabled(),
        };
        debug!(
            admin_events = bridge.admin_events_enabled,
            debug = bridge.debug_enabled,
            "Audit bridge created"
        );

        Ok(bridge)
    }
}

/// Dumps a value as pretty JSON at info level for debug mode.
fn log_debug_json<T: Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => info!("[DEBUG] {label}:\n{json}"),
        Err(e) => warn!(error = %e, "Failed to serialize event for debug logging"),
    }
}
