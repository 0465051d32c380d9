//! Bootstraps the analysis engine: download the batch the server advertises,
//! then expose it through an isolated loader that sees only the host
//! namespaces it was allowed to.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sonar_bootstrapper::{Bootstrapper, SymbolTable, UnmaskSet};
//!
//! # fn main() -> Result<(), sonar_bootstrapper::BootstrapError> {
//! let bootstrapper = Bootstrapper::new("scanner/2.0", "http://localhost:9000", ".sonar")?;
//! let host = Arc::new(SymbolTable::new("host"));
//! let loader = bootstrapper.create_loader(
//!     Vec::<String>::new(),
//!     host,
//!     UnmaskSet::new(["org.slf4j"]),
//! )?;
//! let engine = loader.resolve_symbol("org.sonar.batch.bootstrapper.Batch")?;
//! println!("{} bytes from {:?}", engine.bytes.len(), engine.origin);
//! # Ok(())
//! # }
//! ```

mod cli;
mod commands;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use thiserror::Error;

use bootstrapper_core::config::ServerConfig;
use bootstrapper_core::info_log;
use cli::{Cli, Commands};

pub use bootstrapper_isolation::{
    IsolatedLoader, IsolationError, Symbol, SymbolOrigin, SymbolSource, SymbolTable, UnmaskSet,
};
pub use bootstrapper_remote::{LocalArtifact, RemoteError, ServerIdentity};

/// Anything that can go wrong while bootstrapping.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Remote bootstrap failed")]
    Remote(#[from] RemoteError),

    #[error("Isolated loader setup failed")]
    Isolation(#[from] IsolationError),
}

/// Entry point for embedders: one server, one work directory.
#[derive(Debug)]
pub struct Bootstrapper {
    identity: ServerIdentity,
}

impl Bootstrapper {
    pub fn new(
        product_token: &str,
        server_url: &str,
        work_dir: impl AsRef<Path>,
    ) -> Result<Self, BootstrapError> {
        let identity = ServerIdentity::new(product_token, server_url, work_dir)?;
        Ok(Self { identity })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, BootstrapError> {
        Self::new(&config.product_token, &config.server_url, &config.work_dir)
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn server_url(&self) -> &str {
        self.identity.server_url()
    }

    /// Server version, asked for at most once per instance.
    pub fn server_version(&self) -> Result<&str, BootstrapError> {
        Ok(self.identity.resolve_version()?)
    }

    /// Download the batch into `{work_dir}/batch`, in manifest order.
    pub fn fetch_artifacts(&self) -> Result<Vec<LocalArtifact>, BootstrapError> {
        Ok(self.identity.fetch_manifest_and_artifacts()?)
    }

    /// Download the batch and build a loader over `locations` followed by the
    /// downloaded artifacts. Host symbols come from `parent`, filtered by `unmasked`.
    pub fn create_loader<I, S>(
        &self,
        locations: I,
        parent: Arc<dyn SymbolSource>,
        unmasked: UnmaskSet,
    ) -> Result<IsolatedLoader, BootstrapError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let artifacts = self.fetch_artifacts()?;
        info_log!(
            "Creating isolated loader over {} artifact(s), unmasked {}",
            artifacts.len(),
            unmasked
        );
        let loader = IsolatedLoader::builder(parent, unmasked)
            .add_locations(locations)
            .add_artifacts(artifacts.into_iter().map(|a| a.path))
            .build()?;
        Ok(loader)
    }
}

/// Run the CLI: parse args, set up tracing and dispatch.
pub fn run_cli() -> Result<()> {
    bootstrapper_core::config::load_dotenv();
    let cli = Cli::parse();
    bootstrapper_core::observability::init_tracing();

    let config = commands::server_config(&cli.server);
    match cli.command {
        Commands::Version => commands::version(&config),
        Commands::Fetch => commands::fetch(&config),
        Commands::Resolve {
            symbols,
            unmask,
            locations,
            hosts,
            resource,
        } => commands::resolve(
            &config,
            commands::ResolveRequest {
                symbols,
                unmask,
                locations,
                hosts,
                resource,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_bootstrap_error_reports_cause_once() {
        let err = BootstrapError::from(RemoteError::UnexpectedStatus {
            url: "http://sonar/api/server/version".into(),
            status: 502,
        });
        assert_eq!(err.to_string(), "Remote bootstrap failed");
        assert_eq!(
            err.source().unwrap().to_string(),
            "Status returned by url 'http://sonar/api/server/version' is invalid: 502"
        );

        let chain = format!("{:?}", anyhow::Error::from(err));
        assert_eq!(chain.matches("502").count(), 1);
    }

    #[test]
    fn test_isolation_error_is_wrapped() {
        let err = BootstrapError::from(IsolationError::SymbolNotVisible {
            name: "org.myhost.Internal".into(),
        });
        assert_eq!(err.to_string(), "Isolated loader setup failed");
        assert!(err
            .source()
            .unwrap()
            .to_string()
            .contains("org.myhost.Internal"));
    }
}
