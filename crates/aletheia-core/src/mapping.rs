//! Event-type mapping table loaded from a YAML resource.
//!
//! The resource has three sections: `values` (named string variables),
//! `eventMappings` (one entry per supported event type) and
//! `defaultMapping` (the fallback entry for unmapped types). Every string
//! field in the latter two sections undergoes `$name` variable
//! substitution against the `values` section.
//!
//! A missing or malformed resource never fails the caller: the loader
//! logs the condition and degrades to an empty table with a hardcoded
//! default mapping.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// Default mapping resource shipped with the crate.
const DEFAULT_RESOURCE: &str = include_str!("../resources/event-mappings.yaml");

/// Subtype classification attached to a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeMapping {
    /// Code system the subtype code belongs to.
    pub system: String,

    /// Subtype code.
    pub code: String,

    /// Human-readable display for the code.
    pub display: String,
}

/// Output shape for one event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypeMapping {
    /// Type classification code.
    pub code: String,

    /// Human-readable display for the code.
    pub display: String,

    /// Single-letter action code (C, R, U, D or E).
    pub action: String,

    /// Single-digit outcome code; absent means success (`"0"`).
    pub outcome: Option<String>,

    /// Optional subtype classification.
    pub subtype: Option<SubtypeMapping>,
}

impl EventTypeMapping {
    /// Hardcoded fallback used when no mapping resource is available.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            code: "110100".to_string(),
            display: "Application Activity".to_string(),
            action: "E".to_string(),
            outcome: Some("0".to_string()),
            subtype: None,
        }
    }
}

/// Immutable event-type to output-shape rule set.
///
/// Built once at startup and shared by reference; the key set of the
/// table is the authoritative list of supported subject event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    mappings: HashMap<String, EventTypeMapping>,
    default: EventTypeMapping,
}

impl MappingTable {
    /// Loads the mapping table from the embedded default resource.
    #[must_use]
    pub fn load() -> Self {
        Self::from_yaml_str(DEFAULT_RESOURCE)
    }

    /// Loads the mapping table from a YAML document.
    ///
    /// A malformed document degrades to an empty table with the hardcoded
    /// default mapping; it never fails.
    #[must_use]
    pub fn from_yaml_str(yaml: &str) -> Self {
        match Self::parse(yaml) {
            Ok(table) => {
                info!(mappings = table.mappings.len(), "Loaded event type mappings");
                table
            }
            Err(e) => {
                error!(error = %e, "Failed to load event mappings, using empty table");
                Self::degraded()
            }
        }
    }

    /// Loads the mapping table from a file.
    ///
    /// A missing or unreadable file degrades to an empty table with the
    /// hardcoded default mapping; it never fails.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml_str(&content),
            Err(e) => {
                let err = Error::MappingRead {
                    path: path.display().to_string(),
                    source: e,
                };
                warn!(error = %err, "Mapping resource not found, using empty table");
                Self::degraded()
            }
        }
    }

    /// Strict parse used internally and by tests that want the error.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML or a mapping
    /// entry is structurally invalid.
    pub fn parse(yaml: &str) -> Result<Self> {
        let raw: RawDocument = serde_yaml::from_str(yaml)?;

        let variables = raw.values;
        debug!(variables = variables.len(), "Loaded mapping variables");

        let mut mappings = HashMap::new();
        for (event_type, entry) in raw.event_mappings {
            let mapping = entry.resolve(&event_type, &variables)?;
            mappings.insert(event_type, mapping);
        }

        let default = match raw.default_mapping {
            Some(entry) => entry.resolve("defaultMapping", &variables)?,
            None => EventTypeMapping::fallback(),
        };

        Ok(Self { mappings, default })
    }

    /// Empty table with the hardcoded default, used when loading fails.
    fn degraded() -> Self {
        Self {
            mappings: HashMap::new(),
            default: EventTypeMapping::fallback(),
        }
    }

    /// Returns the mapping for an event type, if one is configured.
    #[must_use]
    pub fn get(&self, event_type: &str) -> Option<&EventTypeMapping> {
        self.mappings.get(event_type)
    }

    /// Returns the mapping for an event type, falling back to the default
    /// mapping for unmapped types (admin `ADMIN_*` tags always land here).
    #[must_use]
    pub fn resolve(&self, event_type: &str) -> &EventTypeMapping {
        self.mappings.get(event_type).unwrap_or(&self.default)
    }

    /// Returns the default mapping.
    #[must_use]
    pub const fn default_mapping(&self) -> &EventTypeMapping {
        &self.default
    }

    /// Returns true when the event type has a configured mapping.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.mappings.contains_key(event_type)
    }

    /// Returns the set of supported event types (the table's key set).
    #[must_use]
    pub fn supported_event_types(&self) -> BTreeSet<&str> {
        self.mappings.keys().map(String::as_str).collect()
    }

    /// Returns the number of configured mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true when no mappings are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Replaces every `$name` occurrence with the variable's value.
///
/// Substitution is literal: applied independently per field, no recursive
/// expansion, no escaping. A literal `$name` that coincides with a defined
/// variable is always substituted — a known limitation of the resource
/// format. Variables are applied in name order so the result is
/// deterministic when one variable name prefixes another.
fn substitute(input: &str, variables: &BTreeMap<String, String>) -> String {
    let mut result = input.to_string();
    for (name, value) in variables {
        result = result.replace(&format!("${name}"), value);
    }
    result
}

/// Raw document shape, prior to variable substitution.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    values: BTreeMap<String, String>,

    #[serde(default, rename = "eventMappings")]
    event_mappings: BTreeMap<String, RawMapping>,

    #[serde(default, rename = "defaultMapping")]
    default_mapping: Option<RawMapping>,
}

#[derive(Debug, Deserialize)]
struct RawMapping {
    code: Option<String>,
    display: Option<String>,
    action: Option<String>,
    outcome: Option<String>,
    subtype: Option<RawSubtype>,
}

#[derive(Debug, Deserialize)]
struct RawSubtype {
    system: Option<String>,
    code: Option<String>,
    display: Option<String>,
}

impl RawMapping {
    /// Applies variable substitution and validates required fields.
    fn resolve(
        self,
        entry: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<EventTypeMapping> {
        let required = |field: &str, value: Option<String>| -> Result<String> {
            value
                .map(|v| substitute(&v, variables))
                .ok_or_else(|| Error::InvalidMapping {
                    entry: entry.to_string(),
                    reason: format!("missing {field}"),
                })
        };

        let subtype = match self.subtype {
            Some(raw) => Some(SubtypeMapping {
                system: required("subtype.system", raw.system)?,
                code: required("subtype.code", raw.code)?,
                display: required("subtype.display", raw.display)?,
            }),
            None => None,
        };

        Ok(EventTypeMapping {
            code: required("code", self.code)?,
            display: required("display", self.display)?,
            action: required("action", self.action)?,
            outcome: self.outcome.map(|v| substitute(&v, variables)),
            subtype,
        })
    }
}
