// Certificate Deduplicator - Fingerprint set shared by capture and AIA fetch phases

use super::parser::Certificate;
use std::collections::HashSet;

/// Outcome of presenting a certificate to the deduplicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    New,
    Duplicate,
}

impl Observation {
    pub fn is_new(self) -> bool {
        self == Observation::New
    }
}

/// Exact-match deduplicator keyed by SHA-256 fingerprint
///
/// Fingerprints are computed over DER, so certificates that only differ in
/// PEM formatting are always recognised as the same entity.
#[derive(Debug, Default)]
pub struct Deduplicator {
    fingerprints: HashSet<String>,
    total_seen: u64,
    duplicates_filtered: u64,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the certificate if unseen
    pub fn observe(&mut self, cert: &Certificate) -> Observation {
        self.total_seen += 1;

        if self.fingerprints.insert(cert.fingerprint().to_string()) {
            Observation::New
        } else {
            self.duplicates_filtered += 1;
            Observation::Duplicate
        }
    }

    /// Get total certificates seen
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// Get total duplicates filtered
    pub fn duplicates_filtered(&self) -> u64 {
        self.duplicates_filtered
    }

    /// Get unique certificates count
    pub fn unique_count(&self) -> u64 {
        self.total_seen - self.duplicates_filtered
    }
}
