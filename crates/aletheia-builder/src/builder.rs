//! Assembles FHIR R4 `AuditEvent` records from normalized events.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use aletheia_core::{AdminOperation, MappingTable, NormalizedEvent, UNKNOWN};

use crate::record::{
    Agent, AgentNetwork, AuditRecord, CodeableConcept, Coding, Entity, Identifier, Observer,
    Reference, Source,
};

// FHIR code systems.
const DICOM_SYSTEM: &str = "http://dicom.nema.org/resources/ontology/DCM";
const SECURITY_ROLE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/extra-security-role-type";
const SECURITY_SOURCE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/security-source-type";
const FHIR_RESOURCE_TYPES_SYSTEM: &str = "http://hl7.org/fhir/resource-types";

/// Bridge-internal code system for identifiers and fallback subtypes.
const AUDIT_SYSTEM: &str = "https://aletheia.dev/fhir/audit-event";

/// Display label of the reporting observer.
const OBSERVER_DISPLAY: &str = "Aletheia";

/// Builds `AuditEvent` records from normalized events and the mapping
/// table.
///
/// Apart from the randomly generated record id, the output is a pure
/// function of the input event and the table.
#[derive(Debug)]
pub struct AuditRecordBuilder {
    table: Arc<MappingTable>,
}

impl AuditRecordBuilder {
    /// Creates a builder over the given mapping table.
    #[must_use]
    pub const fn new(table: Arc<MappingTable>) -> Self {
        Self { table }
    }

    /// Builds an `AuditEvent` record.
    ///
    /// Returns `None` only for an absent event. Unmapped event types
    /// (including every `ADMIN_*` tag) resolve to the default mapping.
    #[must_use]
    pub fn build(&self, event: Option<&NormalizedEvent>) -> Option<AuditRecord> {
        let Some(event) = event else {
            warn!("Cannot build audit record from absent event");
            return None;
        };

        let mapping = self.table.resolve(&event.event_type);

        // Admin tags are deliberately never table keys; their action code
        // comes from the operation type instead of the default mapping.
        let action = event.admin.as_ref().map_or_else(
            || mapping.action.clone(),
            |admin| admin_action(&admin.operation_type).to_string(),
        );

        Some(AuditRecord {
            resource_type: "AuditEvent".to_string(),
            id: Uuid::new_v4().to_string(),
            record_type: Coding::new(DICOM_SYSTEM, &mapping.code, &mapping.display),
            subtype: self.subtype(event),
            action,
            recorded: recorded_timestamp(event.time),
            outcome: mapping.outcome.clone().unwrap_or_else(|| "0".to_string()),
            outcome_desc: event.error.clone(),
            agent: vec![self.agent(event)],
            source: Self::source(event),
            entity: Self::entity(event),
        })
    }

    /// Subtype list: omitted for admin events; for subject events the
    /// configured subtype, or a bridge-namespaced rendering of the raw
    /// event type.
    fn subtype(&self, event: &NormalizedEvent) -> Option<Vec<Coding>> {
        if event.is_admin_event() {
            return None;
        }

        let mapping = self.table.resolve(&event.event_type);
        let coding = mapping.subtype.as_ref().map_or_else(
            || {
                Coding::new(
                    AUDIT_SYSTEM,
                    &event.event_type,
                    &format_event_type(&event.event_type),
                )
            },
            |subtype| Coding::new(&subtype.system, &subtype.code, &subtype.display),
        );

        Some(vec![coding])
    }

    fn agent(&self, event: &NormalizedEvent) -> Agent {
        // Admin records identify the actor by subject id; subject records
        // by the resolved display name.
        let who_value = if event.is_admin_event() {
            event.user_id.clone().unwrap_or_else(|| UNKNOWN.to_string())
        } else if event.username.is_empty() {
            UNKNOWN.to_string()
        } else {
            event.username.clone()
        };

        let network = (!event.ip_address.is_empty() && event.ip_address != UNKNOWN).then(|| {
            AgentNetwork {
                address: event.ip_address.clone(),
                network_type: "2".to_string(),
            }
        });

        Agent {
            agent_type: CodeableConcept {
                coding: vec![Coding::new(SECURITY_ROLE_SYSTEM, "humanuser", "human user")],
            },
            who: Reference {
                identifier: Identifier {
                    system: format!("{AUDIT_SYSTEM}/users"),
                    value: who_value,
                },
            },
            alt_id: (!event.username.is_empty()).then(|| event.username.clone()),
            requestor: true,
            network,
        }
    }

    fn source(event: &NormalizedEvent) -> Source {
        Source {
            site: event.realm_id.clone(),
            observer: Observer {
                display: OBSERVER_DISPLAY.to_string(),
                identifier: Identifier {
                    system: format!("{AUDIT_SYSTEM}/realm"),
                    value: event.realm_id.clone(),
                },
            },
            source_type: vec![Coding::new(SECURITY_SOURCE_SYSTEM, "6", "Security Server")],
        }
    }

    /// Entity list for admin events with a resource path; omitted
    /// otherwise.
    fn entity(event: &NormalizedEvent) -> Option<Vec<Entity>> {
        let admin = event.admin.as_ref()?;
        let path = admin.resource_path.as_deref()?;

        Some(vec![Entity {
            what: Reference {
                identifier: Identifier {
                    system: format!("{AUDIT_SYSTEM}/{}", admin.resource_type.to_lowercase()),
                    value: resource_id(path).to_string(),
                },
            },
            display: representation_display(admin),
            entity_type: Coding::new(
                FHIR_RESOURCE_TYPES_SYSTEM,
                fhir_resource_type(&admin.resource_type),
                &admin.resource_type,
            ),
            description: path.to_string(),
            query: BASE64.encode(path),
        }])
    }
}

/// Formats an epoch-millisecond timestamp as RFC 3339 UTC at second
/// precision with a literal `Z` suffix.
fn recorded_timestamp(time: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(time)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders an event type tag for display: underscores become spaces and
/// the result is sentence-cased (`LOGIN_ERROR` -> `Login error`).
fn format_event_type(event_type: &str) -> String {
    let lower = event_type.replace('_', " ").to_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

/// Final path segment, or the whole path when it has no usable segment.
fn resource_id(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) if index + 1 < path.len() => &path[index + 1..],
        _ => path,
    }
}

/// Probes the opaque representation snapshot for a display name.
///
/// `USER` resources try `username` then `email`; `CLIENT` resources try
/// `clientId`; any resource falls back to a generic `name` field. Parse
/// failures are swallowed and simply omit the display.
fn representation_display(admin: &AdminOperation) -> Option<String> {
    let representation = admin.representation.as_deref()?.trim();
    if representation.is_empty() {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(representation) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Failed to parse resource representation for display name");
            return None;
        }
    };
    let object = value.as_object()?;
    let text = |key: &str| {
        object
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    match admin.resource_type.as_str() {
        "USER" => {
            if let Some(display) = text("username").or_else(|| text("email")) {
                return Some(display);
            }
        }
        "CLIENT" => {
            if let Some(display) = text("clientId") {
                return Some(display);
            }
        }
        _ => {}
    }

    text("name")
}

/// Action code for an administrative operation type.
fn admin_action(operation_type: &str) -> &'static str {
    match operation_type.to_ascii_uppercase().as_str() {
        "CREATE" => "C",
        "UPDATE" => "U",
        "DELETE" => "D",
        _ => "E",
    }
}

/// Maps a host resource-type tag onto the small fixed FHIR vocabulary.
fn fhir_resource_type(resource_type: &str) -> &'static str {
    match resource_type.to_ascii_uppercase().as_str() {
        "USER" => "Person",
        "CLIENT" | "CLIENT_SCOPE" => "Device",
        "REALM" | "REALM_ROLE" | "CLIENT_ROLE" => "Organization",
        "GROUP" => "Group",
        _ => "Resource",
    }
}
