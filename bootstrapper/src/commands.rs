//! CLI command handlers. Results go to stdout, logs to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use bootstrapper_core::config::ServerConfig;
use bootstrapper_isolation::{IsolatedLoader, SymbolOrigin, SymbolSource, SymbolTable, UnmaskSet};

use crate::cli::ServerArgs;
use crate::Bootstrapper;

pub(crate) struct ResolveRequest {
    pub symbols: Vec<String>,
    pub unmask: Vec<String>,
    pub locations: Vec<String>,
    pub hosts: Vec<String>,
    pub resource: bool,
}

/// Environment config with command line overrides applied.
pub(crate) fn server_config(args: &ServerArgs) -> ServerConfig {
    let mut config = ServerConfig::from_env();
    if let Some(url) = &args.server_url {
        config.server_url = url.clone();
    }
    if let Some(token) = &args.product_token {
        config.product_token = token.clone();
    }
    if let Some(dir) = &args.work_dir {
        config.work_dir = PathBuf::from(dir);
    }
    config
}

fn bootstrapper(config: &ServerConfig) -> Result<Bootstrapper> {
    Bootstrapper::from_config(config).with_context(|| {
        format!(
            "Cannot use work directory {}",
            config.work_dir.display()
        )
    })
}

pub(crate) fn version(config: &ServerConfig) -> Result<()> {
    let bootstrapper = bootstrapper(config)?;
    let version = bootstrapper.server_version()?;
    println!("{}", version);
    Ok(())
}

pub(crate) fn fetch(config: &ServerConfig) -> Result<()> {
    let bootstrapper = bootstrapper(config)?;
    for artifact in bootstrapper.fetch_artifacts()? {
        println!("{}\t{}", artifact.name, artifact.path.display());
    }
    Ok(())
}

pub(crate) fn resolve(config: &ServerConfig, request: ResolveRequest) -> Result<()> {
    let bootstrapper = bootstrapper(config)?;
    let host = host_context(&request.hosts)?;
    let unmasked = UnmaskSet::new(config.unmask.iter().chain(&request.unmask));
    let loader = bootstrapper.create_loader(request.locations, host, unmasked)?;

    let mut missing = 0usize;
    for name in &request.symbols {
        let resolved = if request.resource {
            loader.resolve_resource(name)
        } else {
            loader.resolve_symbol(name)
        };
        match resolved {
            Ok(symbol) => println!(
                "{}\t{}\t{} bytes",
                symbol.name,
                origin_label(&symbol.origin),
                symbol.bytes.len()
            ),
            Err(e) => {
                missing += 1;
                println!("{}\t-\t{}", name, e);
            }
        }
    }
    if missing > 0 {
        bail!(
            "{} of {} symbol(s) could not be resolved",
            missing,
            request.symbols.len()
        );
    }
    Ok(())
}

/// Host side made of the given locations, first hit wins. With no locations
/// the host is empty, so unmasking exposes nothing.
fn host_context(locations: &[String]) -> Result<Arc<dyn SymbolSource>> {
    let empty: Arc<dyn SymbolSource> = Arc::new(SymbolTable::new("host"));
    if locations.is_empty() {
        return Ok(empty);
    }
    let host = IsolatedLoader::builder(empty, UnmaskSet::empty())
        .add_locations(locations.iter().cloned())
        .build()
        .context("Invalid --host location")?;
    Ok(Arc::new(host))
}

fn origin_label(origin: &SymbolOrigin) -> String {
    match origin {
        SymbolOrigin::Own { location } => location.clone(),
        SymbolOrigin::Parent => "host".to_string(),
    }
}
