//! # Aletheia Core
//!
//! Core types for the Aletheia audit-event bridge.
//!
//! This crate provides the foundational data structures shared by the
//! bridge pipeline:
//!
//! - [`SubjectEvent`] / [`AdminEvent`] - raw event shapes emitted by the
//!   identity-provider host
//! - [`NormalizedEvent`] - the canonical internal representation produced
//!   by the extractor and consumed by the record builder
//! - [`MappingTable`] - the event-type to output-shape rule set loaded
//!   from a YAML resource
//! - [`UserLookup`] - the narrow collaborator seam for resolving display
//!   names from the host's user store
//!
//! ## Example
//!
//! ```rust
//! use aletheia_core::{MappingTable, SubjectEvent};
//!
//! let table = MappingTable::load();
//! assert!(table.contains("LOGIN"));
//!
//! let event = SubjectEvent::new("LOGIN", 1_700_000_000_000)
//!     .with_user_id("user-123")
//!     .with_realm_id("test-realm");
//! assert_eq!(event.event_type.as_deref(), Some("LOGIN"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod lookup;
pub mod mapping;

pub use error::{Error, Result};
pub use event::{AdminEvent, AdminOperation, AuthDetails, NormalizedEvent, SubjectEvent};
pub use lookup::{LookupError, StaticLookup, UserLookup};
pub use mapping::{EventTypeMapping, MappingTable, SubtypeMapping};

/// Sentinel used wherever an absent value must still render as a string.
pub const UNKNOWN: &str = "unknown";
