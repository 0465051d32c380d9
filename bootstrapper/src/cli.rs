use bootstrapper_core::config::env_keys::{cache, server};
use clap::{Args, Parser, Subcommand};

/// Download the analysis engine batch from a server and load it in isolation.
#[derive(Parser, Debug)]
#[command(name = "sonar-bootstrapper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the environment-derived server config.
#[derive(Args, Debug, Default)]
pub struct ServerArgs {
    /// Server base address (default: http://localhost:9000)
    #[arg(long, global = true, value_name = "URL", env = server::BOOTSTRAPPER_SERVER_URL)]
    pub server_url: Option<String>,

    /// Product token sent in the User-Agent
    #[arg(long, global = true, value_name = "TOKEN", env = server::BOOTSTRAPPER_PRODUCT_TOKEN)]
    pub product_token: Option<String>,

    /// Working directory; artifacts are cached under <DIR>/batch
    #[arg(long, global = true, value_name = "DIR", env = cache::BOOTSTRAPPER_WORK_DIR)]
    pub work_dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the server version
    Version,

    /// Download the batch artifacts into the work directory and list them
    Fetch,

    /// Download the batch, build an isolated loader and resolve symbols in it
    Resolve {
        /// Dotted symbol names (or resource paths with --resource)
        #[arg(value_name = "SYMBOL", required = true)]
        symbols: Vec<String>,

        /// Host namespace visible from the loader (repeatable; adds to BOOTSTRAPPER_UNMASK)
        #[arg(long = "unmask", value_name = "PREFIX")]
        unmask: Vec<String>,

        /// Extra location searched before the artifacts (directory, archive or file: URL)
        #[arg(long = "location", value_name = "LOCATION")]
        locations: Vec<String>,

        /// Location making up the host side (repeatable)
        #[arg(long = "host", value_name = "LOCATION")]
        hosts: Vec<String>,

        /// Treat arguments as resource paths instead of dotted symbols
        #[arg(long, default_value = "false")]
        resource: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_requires_a_symbol() {
        assert!(Cli::try_parse_from(["sonar-bootstrapper", "resolve"]).is_err());
    }

    #[test]
    fn test_resolve_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "sonar-bootstrapper",
            "resolve",
            "org.sonar.batch.Engine",
            "org.slf4j.Logger",
            "--unmask",
            "org.slf4j",
            "--unmask",
            "org.sonar.api",
            "--location",
            "/opt/plugins",
            "--host",
            "/opt/host.jar",
        ])
        .unwrap();

        match cli.command {
            Commands::Resolve {
                symbols,
                unmask,
                locations,
                hosts,
                resource,
            } => {
                assert_eq!(symbols, ["org.sonar.batch.Engine", "org.slf4j.Logger"]);
                assert_eq!(unmask, ["org.slf4j", "org.sonar.api"]);
                assert_eq!(locations, ["/opt/plugins"]);
                assert_eq!(hosts, ["/opt/host.jar"]);
                assert!(!resource);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_server_flags_are_global() {
        let cli = Cli::try_parse_from([
            "sonar-bootstrapper",
            "fetch",
            "--server-url",
            "http://sonar.example:9000/",
            "--work-dir",
            "/tmp/sonar",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Fetch));
        assert_eq!(
            cli.server.server_url.as_deref(),
            Some("http://sonar.example:9000/")
        );
        assert_eq!(cli.server.work_dir.as_deref(), Some("/tmp/sonar"));
    }
}
