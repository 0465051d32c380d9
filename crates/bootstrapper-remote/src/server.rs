use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::RemoteError;
use crate::http::{self, user_agent_for, VERSION_PATH};

/// One bootstrap attempt against one server.
///
/// Holds the normalized server address, the product token sent in the
/// User-Agent, the batch cache directory and the server version once it has
/// been asked for. Nothing here changes after construction except the version,
/// which is written at most once.
#[derive(Debug)]
pub struct ServerIdentity {
    server_url: String,
    product_token: String,
    batch_dir: PathBuf,
    agent: ureq::Agent,
    version: OnceLock<String>,
}

impl ServerIdentity {
    /// `server_url` loses its trailing `/`; `{work_dir}/batch` is created if missing.
    pub fn new(
        product_token: &str,
        server_url: &str,
        work_dir: impl AsRef<Path>,
    ) -> Result<Self, RemoteError> {
        let batch_dir = work_dir.as_ref().join("batch");
        fs::create_dir_all(&batch_dir).map_err(|source| RemoteError::CacheDir {
            path: batch_dir.clone(),
            source,
        })?;

        let user_agent = user_agent_for(env!("CARGO_PKG_VERSION"), product_token);
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            product_token: product_token.to_string(),
            batch_dir,
            agent: http::make_agent(&user_agent),
            version: OnceLock::new(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn product_token(&self) -> &str {
        &self.product_token
    }

    /// `{work_dir}/batch`, where artifacts land.
    pub fn batch_dir(&self) -> &Path {
        &self.batch_dir
    }

    pub fn user_agent(&self) -> String {
        user_agent_for(env!("CARGO_PKG_VERSION"), &self.product_token)
    }

    pub(crate) fn agent(&self) -> &ureq::Agent {
        &self.agent
    }

    /// Server version from `GET {server}/api/server/version`.
    ///
    /// Only the first successful call hits the network; a failed call leaves
    /// the version unresolved so the next call asks again.
    pub fn resolve_version(&self) -> Result<&str, RemoteError> {
        if let Some(version) = self.version.get() {
            return Ok(version);
        }
        let version = self.remote_content(VERSION_PATH)?.trim().to_string();
        tracing::debug!("Server {} reports version {}", self.server_url, version);
        Ok(self.version.get_or_init(|| version))
    }

    /// GET `{server}{path}` and return the whole body as text.
    pub fn remote_content(&self, path: &str) -> Result<String, RemoteError> {
        let url = format!("{}{}", self.server_url, path);
        let response = http::get(&self.agent, &url)?;
        response
            .into_string()
            .map_err(|source| RemoteError::ReadFailed { url, source })
    }
}
