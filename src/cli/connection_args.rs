// Connection, fetch and timeout arguments
// Licensed under GPL-3.0

use clap::Args;

/// Connection and AIA fetch options
///
/// Every field is optional so that unset flags leave the configuration
/// file (or the built-in default) in effect.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Timeout for each AIA fetch in seconds
    #[arg(long = "fetch-timeout", value_name = "SECONDS")]
    pub fetch_timeout: Option<u64>,

    /// TCP connect timeout in seconds
    #[arg(long = "connect-timeout", value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// TLS handshake timeout in seconds
    #[arg(long = "handshake-timeout", value_name = "SECONDS")]
    pub handshake_timeout: Option<u64>,

    /// Maximum number of AIA fetches (0 = unlimited)
    #[arg(long = "max-fetches", value_name = "COUNT")]
    pub max_fetches: Option<usize>,

    /// Fetch issuers even when an already seen certificate matches the issuer name
    #[arg(long = "fetch-known-issuers")]
    pub fetch_known_issuers: bool,

    /// Fail unless the leaf certificate matches the requested hostname
    #[arg(long = "verify-hostname")]
    pub verify_hostname: bool,
}
