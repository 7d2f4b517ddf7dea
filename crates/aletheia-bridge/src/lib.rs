//! # Aletheia Bridge
//!
//! Host-facing wiring for the audit-event bridge: environment-driven
//! configuration and the [`AuditBridge`] orchestrator that runs each host
//! event through extract → build → send.
//!
//! The bridge is designed so that nothing it does can disturb the host's
//! event pipeline: unsupported events are skipped, delivery failures are
//! logged and dropped, and no error crosses back to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use aletheia_bridge::{AuditBridge, BridgeConfig};
//! use aletheia_core::SubjectEvent;
//!
//! # async fn example() -> Result<(), aletheia_client::DeliveryError> {
//! let bridge = AuditBridge::builder(BridgeConfig::from_env()).build()?;
//!
//! let event = SubjectEvent::new("LOGIN", 1_700_000_000_000)
//!     .with_user_id("user-123")
//!     .with_realm_id("test-realm");
//! bridge.on_subject_event(Some(&event)).await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod config;
pub mod telemetry;

pub use bridge::{AuditBridge, AuditBridgeBuilder};
pub use config::BridgeConfig;
