//! # Aletheia Client
//!
//! Delivery client for forwarding FHIR `AuditEvent` records to a collector
//! endpoint.
//!
//! The client owns the only I/O and concurrency in the bridge: it
//! serializes a record, attaches an `Authorization` header per the
//! configured [`DeliveryAuth`] strategy, and POSTs it to the collector.
//! Delivery is fire-and-forget by default — failures are logged and the
//! record is dropped, never retried — with an explicit synchronous path
//! for callers that want the error.
//!
//! ## Example
//!
//! ```no_run
//! use aletheia_client::{DeliveryAuth, DeliveryClient, DeliveryConfig};
//!
//! # async fn example() -> Result<(), aletheia_client::DeliveryError> {
//! let config = DeliveryConfig::new("https://collector.example.com/fhir")
//!     .with_auth(DeliveryAuth::bearer("my-token"))
//!     .with_async_enabled(false);
//! let client = DeliveryClient::new(config)?;
//!
//! client.send(None).await; // logged and skipped, never an error
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use client::DeliveryClient;
pub use config::{DeliveryAuth, DeliveryConfig, TokenProvider};
pub use error::DeliveryError;
