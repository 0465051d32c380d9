pub mod config;
pub mod log;
pub mod observability;

// Used by `info_log!` so callers need no direct `tracing` dependency.
#[doc(hidden)]
pub use tracing;
