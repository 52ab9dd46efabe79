// CLI module - Command line interface and argument parsing
// Licensed under GPL-3.0

use crate::config::ResolverConfig;
use clap::Parser;
use std::path::PathBuf;

mod connection_args;
mod output_args;

pub use connection_args::ConnectionArgs;
pub use output_args::OutputArgs;

/// cabundler - Recover missing intermediate CA certificates
///
/// Connects to a TLS server, captures the chain it presents and follows the
/// AIA CA Issuers URIs breadth-first to build a PEM bundle of intermediates.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, long_about = None)]
#[command(name = "cabundler")]
#[command(about = "Build a CA bundle of missing intermediates by following AIA URIs", long_about = None)]
pub struct Args {
    // ============ Target Specification ============
    /// Target (host, host:port or URL)
    #[arg(value_name = "HOST[:PORT]|URL")]
    pub target: Option<String>,

    // ============ Configuration ============
    /// Load settings from a TOML file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write an example configuration file and exit
    #[arg(long = "config-example", value_name = "FILE")]
    pub config_example: Option<PathBuf>,

    // ============ Connection and Fetch Settings ============
    #[command(flatten)]
    pub connection: ConnectionArgs,

    // ============ Output ============
    #[command(flatten)]
    pub output: OutputArgs,
}

impl Args {
    /// Validate CLI arguments for logical consistency
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.config_example.is_none() && self.target.is_none() {
            anyhow::bail!("No target specified. Usage: cabundler <HOST[:PORT]|URL>");
        }

        if let Some(output) = &self.output.output
            && output.trim().is_empty()
        {
            anyhow::bail!("--output must not be empty");
        }

        for (flag, value) in [
            ("--fetch-timeout", self.connection.fetch_timeout),
            ("--connect-timeout", self.connection.connect_timeout),
            ("--handshake-timeout", self.connection.handshake_timeout),
        ] {
            if value == Some(0) {
                anyhow::bail!("{} must be greater than zero", flag);
            }
        }

        Ok(())
    }

    /// Overlay flags that were given on top of the loaded configuration
    pub fn apply_to(&self, config: &mut ResolverConfig) {
        let connection = &self.connection;
        if let Some(secs) = connection.fetch_timeout {
            config.fetch_timeout_secs = secs;
        }
        if let Some(secs) = connection.connect_timeout {
            config.connect_timeout_secs = secs;
        }
        if let Some(secs) = connection.handshake_timeout {
            config.handshake_timeout_secs = secs;
        }
        if let Some(max) = connection.max_fetches {
            config.max_fetches = max;
        }
        if connection.fetch_known_issuers {
            config.skip_known_issuers = false;
        }
        if connection.verify_hostname {
            config.verify_hostname = true;
        }

        let output = &self.output;
        if let Some(path) = &output.output {
            config.output = path.clone();
        }
        if output.include_roots {
            config.include_roots = true;
        }
        if output.merge_system_bundle {
            config.merge_system_bundle = true;
        }
        if let Some(path) = &output.system_bundle {
            config.system_bundle = Some(path.clone());
            config.merge_system_bundle = true;
        }
    }

    /// Load the configuration file (or defaults) and apply CLI overrides
    pub fn resolve_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_file(path)?,
            None => ResolverConfig::default(),
        };

        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::parse_from(["cabundler", "example.com"]);
        assert_eq!(args.target.as_deref(), Some("example.com"));
        assert!(args.validate().is_ok());

        let config = args.resolve_config().unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_missing_target_rejected() {
        let args = Args::parse_from(["cabundler"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["cabundler", "--config-example", "out.toml"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "cabundler",
            "example.com:8443",
            "-o",
            "-",
            "--include-roots",
            "--max-fetches",
            "0",
            "--fetch-timeout",
            "3",
            "--verify-hostname",
            "--fetch-known-issuers",
            "--system-bundle",
            "/tmp/roots.pem",
        ]);

        let mut config = ResolverConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.output, "-");
        assert!(config.include_roots);
        assert_eq!(config.max_fetches, 0);
        assert_eq!(config.fetch_timeout_secs, 3);
        assert!(config.verify_hostname);
        assert!(!config.skip_known_issuers);
        assert!(config.merge_system_bundle);
        assert_eq!(config.system_bundle, Some(PathBuf::from("/tmp/roots.pem")));
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_unset_flags_keep_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cabundler.toml");
        std::fs::write(&path, "include_roots = true\noutput = \"chain.pem\"\n").unwrap();

        let args = Args::parse_from([
            "cabundler",
            "example.com",
            "--config",
            path.to_str().unwrap(),
        ]);
        let config = args.resolve_config().unwrap();

        assert!(config.include_roots);
        assert_eq!(config.output, "chain.pem");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = Args::parse_from(["cabundler", "example.com", "--connect-timeout", "0"]);
        assert!(args.validate().is_err());
    }
}
