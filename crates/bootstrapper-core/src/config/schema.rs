//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{cache, isolation, observability as obv_keys, server};
use super::loader::{env_bool, env_list, env_optional, env_or};
use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:9000";
pub const DEFAULT_PRODUCT_TOKEN: &str = "sonar-bootstrapper-cli";

/// Where to bootstrap from and where to cache the downloaded batch.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_url: String,
    pub product_token: String,
    pub work_dir: PathBuf,
    /// Host namespaces visible from the isolated loader.
    pub unmask: Vec<String>,
}

impl ServerConfig {
    /// Load from the environment (`.env` included); unset values use defaults.
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let server_url = env_or(
            server::BOOTSTRAPPER_SERVER_URL,
            server::SERVER_URL_ALIASES,
            || DEFAULT_SERVER_URL.to_string(),
        );
        let product_token = env_or(server::BOOTSTRAPPER_PRODUCT_TOKEN, &[], || {
            DEFAULT_PRODUCT_TOKEN.to_string()
        });
        let work_dir = env_optional(cache::BOOTSTRAPPER_WORK_DIR, cache::WORK_DIR_ALIASES)
            .map(PathBuf::from)
            .unwrap_or_else(default_work_dir);
        let unmask = env_list(isolation::BOOTSTRAPPER_UNMASK, &[]);
        Self {
            server_url,
            product_token,
            work_dir,
            unmask,
        }
    }
}

/// `<platform cache dir>/sonar-bootstrapper`, or `./.sonar` when the platform has none.
pub fn default_work_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("sonar-bootstrapper"))
        .unwrap_or_else(|| PathBuf::from(".sonar"))
}

/// Observability: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::BOOTSTRAPPER_QUIET, &[], false),
                log_level: env_or(obv_keys::BOOTSTRAPPER_LOG_LEVEL, &[], || {
                    "warn,sonar_bootstrapper=info,bootstrapper_remote=info,bootstrapper_isolation=info"
                        .to_string()
                }),
                log_json: env_bool(obv_keys::BOOTSTRAPPER_LOG_JSON, &[], false),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_work_dir_is_named_after_tool() {
        let dir = default_work_dir();
        assert!(dir.ends_with("sonar-bootstrapper") || dir.ends_with(".sonar"));
    }
}
