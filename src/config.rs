// Resolver Configuration

use crate::certificates::bundle::DEFAULT_OUTPUT_FILE;
use crate::certificates::fetcher::DEFAULT_MAX_RESPONSE_BYTES;
use crate::certificates::resolver::{DEFAULT_MAX_FETCHES, ResolverOptions};
use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per AIA fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// TLS handshake timeout in seconds
    pub handshake_timeout_secs: u64,

    /// Maximum AIA fetches per run (0 = unlimited)
    pub max_fetches: usize,

    /// Largest accepted AIA response body in bytes
    pub max_response_bytes: usize,

    /// Include self-signed roots in the bundle
    pub include_roots: bool,

    /// Skip fetching for certificates whose issuer is already known
    pub skip_known_issuers: bool,

    /// Require the leaf to match the requested hostname
    pub verify_hostname: bool,

    /// Append the system trust bundle to the output
    pub merge_system_bundle: bool,

    /// System bundle path (discovered when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_bundle: Option<PathBuf>,

    /// Output file, "-" for stdout
    pub output: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            connect_timeout_secs: 10,
            handshake_timeout_secs: 10,
            max_fetches: DEFAULT_MAX_FETCHES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            include_roots: false,
            skip_known_issuers: true,
            verify_hostname: false,
            merge_system_bundle: false,
            system_bundle: None,
            output: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Create config from file
    pub fn from_file(path: &Path) -> ResolveResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ResolveError::FileSystem {
            path: path.display().to_string(),
            source,
        })?;

        let config: ResolverConfig = toml::from_str(&content).map_err(|e| ResolveError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Create example config file
    pub fn create_example(path: &Path) -> ResolveResult<()> {
        let config = Self::default();
        let toml = toml::to_string_pretty(&config).map_err(|e| ResolveError::Config {
            message: e.to_string(),
        })?;

        std::fs::write(path, toml).map_err(|source| ResolveError::FileSystem {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reject values that would make every network call fail immediately
    pub fn validate(&self) -> ResolveResult<()> {
        for (name, value) in [
            ("fetch_timeout_secs", self.fetch_timeout_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
            ("handshake_timeout_secs", self.handshake_timeout_secs),
        ] {
            if value == 0 {
                return Err(ResolveError::Config {
                    message: format!("{} must be greater than zero", name),
                });
            }
        }

        if self.max_response_bytes == 0 {
            return Err(ResolveError::Config {
                message: "max_response_bytes must be greater than zero".to_string(),
            });
        }

        if self.output.trim().is_empty() {
            return Err(ResolveError::Config {
                message: "output must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn to_resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            include_roots: self.include_roots,
            max_fetches: (self.max_fetches > 0).then_some(self.max_fetches),
            skip_known_issuers: self.skip_known_issuers,
        }
    }
}
