//! Environment variable keys and their aliases.
//!
//! Primary variables use the `BOOTSTRAPPER_*` prefix; the older runner
//! variables (`SONAR_HOST_URL`, `SONAR_USER_HOME`) are accepted as aliases.

/// Server connection
pub mod server {
    pub const BOOTSTRAPPER_SERVER_URL: &str = "BOOTSTRAPPER_SERVER_URL";
    pub const SERVER_URL_ALIASES: &[&str] = &["SONAR_HOST_URL"];

    /// Product token appended to the User-Agent header.
    pub const BOOTSTRAPPER_PRODUCT_TOKEN: &str = "BOOTSTRAPPER_PRODUCT_TOKEN";
}

/// Work directory holding the `batch/` artifact cache
pub mod cache {
    pub const BOOTSTRAPPER_WORK_DIR: &str = "BOOTSTRAPPER_WORK_DIR";
    pub const WORK_DIR_ALIASES: &[&str] = &["SONAR_USER_HOME"];
}

/// Isolation
pub mod isolation {
    /// Comma separated namespace prefixes visible from the host, e.g. "org.slf4j,org.sonar.api".
    pub const BOOTSTRAPPER_UNMASK: &str = "BOOTSTRAPPER_UNMASK";
}

/// Observability and logging
pub mod observability {
    pub const BOOTSTRAPPER_QUIET: &str = "BOOTSTRAPPER_QUIET";
    pub const BOOTSTRAPPER_LOG_LEVEL: &str = "BOOTSTRAPPER_LOG_LEVEL";
    pub const BOOTSTRAPPER_LOG_JSON: &str = "BOOTSTRAPPER_LOG_JSON";
}
