// Bundle - Ordered, deduplicated intermediate certificates and their PEM output

use super::parser::{Certificate, CertificateSummary};
use crate::error::{ResolveError, ResolveResult};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = "ca-bundle.pem";

/// Where a bundle certificate came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Sent by the server during the handshake (position 0 is the leaf)
    Presented { position: usize },
    /// Downloaded from the CA Issuers URI of the certificate `parent`
    Aia { uri: String, parent: String },
}

/// A certificate admitted to the bundle
#[derive(Debug, Clone)]
pub struct BundleEntry {
    pub certificate: Certificate,
    pub origin: Origin,
}

/// Serializable view of a bundle entry
#[derive(Debug, Clone, Serialize)]
pub struct BundleEntrySummary {
    #[serde(flatten)]
    pub certificate: CertificateSummary,
    pub origin: Origin,
}

/// Certificates in the order they were discovered
///
/// Entries are never re-sorted; the resolver guarantees fingerprints are unique.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    entries: Vec<BundleEntry>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, certificate: Certificate, origin: Origin) {
        debug_assert!(!self.contains_fingerprint(certificate.fingerprint()));
        self.entries.push(BundleEntry {
            certificate,
            origin,
        });
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.entries.iter().map(|e| &e.certificate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_fingerprint(&self, fingerprint: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.certificate.fingerprint() == fingerprint)
    }

    /// Concatenated PEM blocks, each followed by a blank line
    pub fn to_pem_string(&self) -> String {
        let mut out = String::new();
        for cert in self.certificates() {
            push_pem_block(&mut out, cert);
        }
        out
    }

    pub fn summaries(&self) -> Vec<BundleEntrySummary> {
        self.entries
            .iter()
            .map(|e| BundleEntrySummary {
                certificate: e.certificate.summary(),
                origin: e.origin.clone(),
            })
            .collect()
    }
}

fn push_pem_block(out: &mut String, cert: &Certificate) {
    out.push_str(&cert.to_pem());
    out.push('\n');
}

/// Output sink for the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// "-" selects stdout, anything else is a file path
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            OutputTarget::File(path) => path.display().to_string(),
            OutputTarget::Stdout => "<stdout>".to_string(),
        }
    }
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::File(PathBuf::from(DEFAULT_OUTPUT_FILE))
    }
}

/// What was written by `BundleWriter::write`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub intermediates: usize,
    pub merged: usize,
    pub bytes: usize,
}

/// Serializes a bundle, optionally followed by trust store certificates
pub struct BundleWriter {
    target: OutputTarget,
    merged: Vec<Certificate>,
}

impl BundleWriter {
    pub fn new(target: OutputTarget) -> Self {
        Self {
            target,
            merged: Vec::new(),
        }
    }

    /// Append these certificates after the bundle, skipping fingerprints already written
    pub fn with_merged(mut self, certificates: Vec<Certificate>) -> Self {
        self.merged = certificates;
        self
    }

    /// Render the output text without writing it
    pub fn render(&self, bundle: &Bundle) -> (String, WriteStats) {
        let mut out = bundle.to_pem_string();
        let mut written: HashSet<&str> = bundle.certificates().map(|c| c.fingerprint()).collect();

        let mut merged = 0;
        for cert in &self.merged {
            if written.insert(cert.fingerprint()) {
                push_pem_block(&mut out, cert);
                merged += 1;
            }
        }

        let stats = WriteStats {
            intermediates: bundle.len(),
            merged,
            bytes: out.len(),
        };
        (out, stats)
    }

    pub fn write(&self, bundle: &Bundle) -> ResolveResult<WriteStats> {
        let (text, stats) = self.render(bundle);

        if bundle.is_empty() {
            tracing::warn!("Bundle is empty; writing {} anyway", self.target.describe());
        }

        match &self.target {
            OutputTarget::File(path) => {
                std::fs::write(path, text.as_bytes()).map_err(|source| {
                    ResolveError::FileSystem {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
            }
            OutputTarget::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|_| stdout.flush())
                    .map_err(|source| ResolveError::FileSystem {
                        path: "<stdout>".to_string(),
                        source,
                    })?;
            }
        }

        tracing::info!(
            "Wrote {} intermediate(s) and {} merged trust store certificate(s) to {}",
            stats.intermediates,
            stats.merged,
            self.target.describe()
        );

        Ok(stats)
    }
}
