//! Tracing initialization.
//!
//! Reads `ObservabilityConfig` for BOOTSTRAPPER_QUIET, BOOTSTRAPPER_LOG_LEVEL
//! and BOOTSTRAPPER_LOG_JSON. `RUST_LOG` wins over all of them when set.

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize tracing. Call once at process startup; later calls are no-ops.
/// In quiet mode only WARN and above are logged.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = if cfg.quiet {
        "warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);
    let layer = if cfg.log_json {
        layer.json().boxed()
    } else {
        layer.boxed()
    };

    // A subscriber installed by an embedding process wins.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
