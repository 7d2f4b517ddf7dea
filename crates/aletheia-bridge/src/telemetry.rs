//! Tracing setup for hosts that do not bring their own subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes a global tracing subscriber with an env-filter.
///
/// Honors `RUST_LOG` and falls back to `aletheia=info`. Hosts that
/// already install a subscriber should skip this; calling it twice
/// panics, like any double subscriber registration.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aletheia=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
