//! Logging setup using tracing.
//!
//! Diagnostics always go to stderr so stdout stays clean for data
//! (`cuppa export --stdout`).
//!
//! # Example RUST_LOG values
//! - `RUST_LOG=info` - Show info and above
//! - `RUST_LOG=cuppa::store=debug` - Store reads and writes only

use crate::error::{CuppaError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
///
/// # Errors
/// Returns an error if a global subscriber has already been installed.
pub fn init(verbose: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .try_init()
        .map_err(|e| CuppaError::Config(format!("Failed to initialize tracing: {}", e)))
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init(true);
}
