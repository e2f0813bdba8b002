//! Tracing setup shared by binaries and demos.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` (default
//! `info`) and the fmt layer. Installing twice is harmless: the second call
//! keeps the existing global subscriber.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global tracing subscriber for `service_name`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(service_name: &str) -> bool {
    // Use RUST_LOG when set; default to "info" if unset or invalid.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(service = service_name, "tracing initialized");
    }
    installed
}
