//! # Aletheia Builder
//!
//! Event normalization and FHIR R4 `AuditEvent` assembly.
//!
//! Two pure transforms live here:
//!
//! - [`EventExtractor`] filters raw host events and normalizes them into
//!   [`aletheia_core::NormalizedEvent`] values, resolving the acting
//!   subject's display name through a prioritized fallback chain.
//! - [`AuditRecordBuilder`] consumes a normalized event together with the
//!   mapping table and assembles the typed [`AuditRecord`] wire model.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aletheia_builder::{AuditRecordBuilder, EventExtractor};
//! use aletheia_core::{MappingTable, SubjectEvent};
//!
//! let table = Arc::new(MappingTable::load());
//! let extractor = EventExtractor::new(Arc::clone(&table));
//! let builder = AuditRecordBuilder::new(table);
//!
//! let event = SubjectEvent::new("LOGIN", 1_700_000_000_000)
//!     .with_user_id("user-123")
//!     .with_realm_id("test-realm");
//!
//! let normalized = extractor.extract_subject_event(Some(&event));
//! let record = builder.build(normalized.as_ref()).unwrap();
//! assert_eq!(record.action, "E");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod extractor;
pub mod record;

pub use builder::AuditRecordBuilder;
pub use extractor::EventExtractor;
pub use record::{
    Agent, AgentNetwork, AuditRecord, CodeableConcept, Coding, Entity, Identifier, Observer,
    Reference, Source,
};
