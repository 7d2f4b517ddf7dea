//! Typed wire model for FHIR R4 `AuditEvent` resources.
//!
//! Field names serialize exactly as the collector expects them; optional
//! sections are omitted rather than serialized as null. The model is
//! deliberately limited to the fields this bridge emits.

use serde::{Deserialize, Serialize};

/// A `{system, code, display}` coded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    /// Code system URI.
    pub system: String,

    /// Code within the system.
    pub code: String,

    /// Human-readable display for the code.
    pub display: String,
}

impl Coding {
    /// Creates a coded value.
    #[must_use]
    pub fn new(system: &str, code: &str, display: &str) -> Self {
        Self {
            system: system.to_string(),
            code: code.to_string(),
            display: display.to_string(),
        }
    }
}

/// A concept carrying one or more codings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    /// Codings describing the concept.
    pub coding: Vec<Coding>,
}

/// A namespaced identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier namespace URI.
    pub system: String,

    /// Identifier value.
    pub value: String,
}

/// A reference to a participant or resource, by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Identifier of the referenced item.
    pub identifier: Identifier,
}

/// Network endpoint of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentNetwork {
    /// Network address (IP).
    pub address: String,

    /// Network address type code (`"2"` = IP address).
    #[serde(rename = "type")]
    pub network_type: String,
}

/// The actor participating in the audited event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Role classification of the actor.
    #[serde(rename = "type")]
    pub agent_type: CodeableConcept,

    /// Who performed the action.
    pub who: Reference,

    /// Alternative actor identifier (the resolved display name).
    #[serde(rename = "altId", skip_serializing_if = "Option::is_none")]
    pub alt_id: Option<String>,

    /// Whether the actor initiated the event.
    pub requestor: bool,

    /// Network access point, when a real address is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<AgentNetwork>,
}

/// The system reporting the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observer {
    /// Display label of the reporting system.
    pub display: String,

    /// Identifier of the reporting system (realm-scoped).
    pub identifier: Identifier,
}

/// Audit source block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Logical site of the audit source (the realm).
    pub site: String,

    /// The observer that reported the event.
    pub observer: Observer,

    /// Source type classification.
    #[serde(rename = "type")]
    pub source_type: Vec<Coding>,
}

/// A resource affected by the audited event (admin operations only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier of the affected resource.
    pub what: Reference,

    /// Display name resolved from the resource snapshot, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    /// Resource type classification.
    #[serde(rename = "type")]
    pub entity_type: Coding,

    /// Raw resource path.
    pub description: String,

    /// Base64-encoded resource path. The external schema forbids `name`
    /// and `query` from both being populated; carrying the path here and
    /// never emitting `name` keeps the record valid while staying
    /// machine round-trippable.
    pub query: String,
}

/// A FHIR R4 `AuditEvent` resource as emitted by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Always `"AuditEvent"`.
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    /// Randomly generated record identifier.
    pub id: String,

    /// Type classification of the event.
    #[serde(rename = "type")]
    pub record_type: Coding,

    /// Subtype classifications; omitted for admin events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Vec<Coding>>,

    /// Action code (C, R, U, D or E).
    pub action: String,

    /// Event timestamp, RFC 3339 UTC at second precision.
    pub recorded: String,

    /// Outcome code (`"0"` = success).
    pub outcome: String,

    /// Raw error string for failure events.
    #[serde(rename = "outcomeDesc", skip_serializing_if = "Option::is_none")]
    pub outcome_desc: Option<String>,

    /// The single acting agent.
    pub agent: Vec<Agent>,

    /// The reporting source.
    pub source: Source,

    /// Affected resources; present only for admin events with a resource
    /// path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Vec<Entity>>,
}
