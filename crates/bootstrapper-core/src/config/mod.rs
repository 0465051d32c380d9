//! Unified configuration layer.
//!
//! Every environment variable is read here; the remote client, the loader and
//! the CLI only see typed config structs, never `std::env::var`.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `env_list` helpers and `.env` loading
//! - `schema`: `ServerConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants (with legacy aliases)

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_list, env_optional, env_or, load_dotenv, load_dotenv_from_dir};
pub use schema::{ObservabilityConfig, ServerConfig};
