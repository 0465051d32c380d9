//! Quiet-mode aware logging. When BOOTSTRAPPER_QUIET=1 (e.g. embedded in a build tool), suppress [INFO].
//! Uses `tracing::info!` so output is captured by the tracing subscriber.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            $crate::tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    crate::config::ObservabilityConfig::from_env().quiet
}
