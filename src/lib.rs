// cabundler - Recover missing intermediate CA certificates via AIA
// Licensed under GPL-3.0

//! cabundler connects to a TLS server, captures the certificate chain it
//! presents and follows the Authority Information Access "CA Issuers" URIs
//! breadth-first to recover intermediates the server failed to send. The
//! result is an ordered, deduplicated PEM bundle.

pub mod certificates;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use crate::certificates::{
    Bundle, Certificate, ChainCapture, ChainResolver, HttpFetcher, IssuerFetcher, Resolution,
    ResolverOptions,
};
pub use crate::cli::Args;
pub use crate::config::ResolverConfig;
pub use crate::error::{ResolveError, ResolveResult, ResolveWarning};

/// Result type for cabundler commands
pub type Result<T> = anyhow::Result<T>;

/// Error type for cabundler commands
pub use anyhow::Error;
