//! Logging initialization.
//!
//! Structured console logging via `tracing`, filtered by the `RUST_LOG`
//! environment variable (defaults to `info`). Library code only emits
//! through the `tracing` macros; installing a subscriber is the host's
//! choice, and this helper is a convenience for hosts without their own.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize console logging.
///
/// Respects `RUST_LOG`; defaults to `info` when unset. Returns an error if a
/// global subscriber is already installed.
pub fn init_logging() -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| e.to_string())
}
