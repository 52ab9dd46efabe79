// Error types for cabundler
//
// Fatal errors abort a resolution run. Per-item failures that the resolver
// recovers from are reported as `ResolveWarning`s on the resolution result.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for operations that fail with a `ResolveError`
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Main error type for chain capture and resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// DNS, TCP or TLS failure while capturing the presented chain
    #[error("Connection to {target} failed: {details}")]
    Connection { target: String, details: String },

    /// Connect or handshake did not finish in time
    #[error("Connection to {target} timed out after {duration:?}")]
    ConnectionTimeout { target: String, duration: Duration },

    /// Handshake completed but no usable certificate was presented
    #[error("No certificates found in the chain presented by {target}")]
    NoCertificatesFound { target: String },

    /// Bytes could not be interpreted as a PEM or DER certificate
    #[error("Malformed certificate: {details}")]
    MalformedCertificate { details: String },

    /// An AIA CA Issuers URI could not be retrieved
    #[error("Failed to fetch {uri}: {details}")]
    FetchFailure { uri: String, details: String },

    /// Leaf certificate does not cover the requested hostname
    #[error("Hostname {hostname} does not match leaf certificate (names: {names})")]
    HostnameMismatch { hostname: String, names: String },

    /// Target string could not be parsed
    #[error("Invalid target '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Merging the system trust bundle was requested but none was found
    #[error("No system trust bundle found (searched: {searched})")]
    SystemBundleNotFound { searched: String },

    /// File system errors
    #[error("File system error: {path}: {source}")]
    FileSystem {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ResolveError {
    /// Whether the error aborts the whole run
    ///
    /// Malformed certificates and fetch failures only abandon one item or one
    /// branch of the AIA walk.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ResolveError::MalformedCertificate { .. } | ResolveError::FetchFailure { .. }
        )
    }

    pub(crate) fn malformed(details: impl Into<String>) -> Self {
        ResolveError::MalformedCertificate {
            details: details.into(),
        }
    }

    pub(crate) fn fetch(uri: &str, details: impl Into<String>) -> Self {
        ResolveError::FetchFailure {
            uri: uri.to_string(),
            details: details.into(),
        }
    }
}

/// Non-fatal conditions surfaced to the user after a run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A presented or fetched certificate was skipped
    #[error("Skipped malformed certificate from {source_desc}: {details}")]
    MalformedCertificate { source_desc: String, details: String },

    /// A branch of the AIA walk was abandoned
    #[error("Could not fetch issuer from {uri}: {details}")]
    FetchFailed { uri: String, details: String },

    /// The fetch budget was exhausted before the queue drained
    #[error("Fetch limit of {limit} reached; remaining AIA URIs were not followed")]
    FetchLimitReached { limit: usize },

    /// Resolution finished without any intermediate certificate
    #[error("No intermediate certificates found; the bundle is empty")]
    EmptyBundle,
}

impl ResolveWarning {
    /// Convert a recoverable error into a warning, tagging where it came from
    pub fn from_error(err: &ResolveError, source_desc: &str) -> Self {
        match err {
            ResolveError::FetchFailure { uri, details } => ResolveWarning::FetchFailed {
                uri: uri.clone(),
                details: details.clone(),
            },
            ResolveError::MalformedCertificate { details } => {
                ResolveWarning::MalformedCertificate {
                    source_desc: source_desc.to_string(),
                    details: details.clone(),
                }
            }
            other => ResolveWarning::MalformedCertificate {
                source_desc: source_desc.to_string(),
                details: other.to_string(),
            },
        }
    }
}
