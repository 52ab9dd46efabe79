// Chain Resolver - Breadth-first AIA walk that recovers missing intermediates

use super::bundle::{Bundle, Origin};
use super::dedup::{Deduplicator, Observation};
use super::fetcher::IssuerFetcher;
use super::parser::Certificate;
use crate::error::{ResolveError, ResolveResult, ResolveWarning};
use std::collections::{HashSet, VecDeque};

/// Default cap on AIA fetches per run
pub const DEFAULT_MAX_FETCHES: usize = 50;

/// Tunables for one resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Put self-signed certificates in the bundle as well
    pub include_roots: bool,
    /// Upper bound on fetch attempts; `None` is unlimited
    pub max_fetches: Option<usize>,
    /// Do not fetch for a certificate whose issuer has already been seen
    pub skip_known_issuers: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            include_roots: false,
            max_fetches: Some(DEFAULT_MAX_FETCHES),
            skip_known_issuers: true,
        }
    }
}

/// Result of a completed walk
#[derive(Debug, Clone)]
pub struct Resolution {
    pub leaf: Certificate,
    pub bundle: Bundle,
    /// Self-signed certificates encountered, in discovery order
    pub roots: Vec<Certificate>,
    pub warnings: Vec<ResolveWarning>,
    /// Number of fetch attempts made
    pub fetches: usize,
    /// The fetch limit stopped the walk before the queue drained
    pub truncated: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }
}

/// Resolves a presented chain into a bundle of intermediates
pub struct ChainResolver<F: IssuerFetcher> {
    fetcher: F,
    options: ResolverOptions,
}

impl<F: IssuerFetcher> ChainResolver<F> {
    pub fn new(fetcher: F, options: ResolverOptions) -> Self {
        Self { fetcher, options }
    }

    /// Walk the AIA graph starting from the presented chain (leaf first)
    pub async fn resolve(&self, chain: &[Certificate]) -> ResolveResult<Resolution> {
        let (leaf, presented) = chain
            .split_first()
            .ok_or_else(|| ResolveError::NoCertificatesFound {
                target: "presented chain".to_string(),
            })?;

        let mut run = ResolutionRun::new(leaf.clone(), self.options.clone());

        for (index, cert) in presented.iter().enumerate() {
            run.admit(cert.clone(), Origin::Presented { position: index + 1 });
        }

        while let Some(cert) = run.queue.pop_front() {
            if !run.visited.insert(cert.fingerprint().to_string()) {
                continue;
            }

            if self.options.skip_known_issuers && run.issuer_known(&cert) {
                tracing::debug!("Issuer of {} already present, not fetching", cert);
                continue;
            }

            if cert.ca_issuers().is_empty() {
                tracing::debug!("{} has no CA Issuers URI", cert);
                continue;
            }

            for uri in cert.ca_issuers() {
                if run.fetch_budget_exhausted() {
                    run.truncate();
                    break;
                }

                run.fetches += 1;
                let fetched = self
                    .fetcher
                    .fetch(uri)
                    .await
                    .and_then(|bytes| Certificate::normalize(&bytes));

                match fetched {
                    Ok(issuer) => {
                        let origin = Origin::Aia {
                            uri: uri.clone(),
                            parent: cert.fingerprint().to_string(),
                        };
                        let admission = run.admit(issuer, origin);
                        tracing::debug!("{} -> {:?}", uri, admission);
                    }
                    Err(e) => {
                        tracing::warn!("Abandoning AIA branch {}: {}", uri, e);
                        run.warnings.push(ResolveWarning::from_error(&e, uri));
                    }
                }
            }

            if run.truncated {
                break;
            }
        }

        Ok(run.finish())
    }
}

/// What happened to a certificate handed to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Added,
    Root,
    Duplicate,
}

/// Mutable state owned by a single resolution
struct ResolutionRun {
    options: ResolverOptions,
    leaf: Certificate,
    dedup: Deduplicator,
    queue: VecDeque<Certificate>,
    visited: HashSet<String>,
    known_subjects: Vec<Certificate>,
    bundle: Bundle,
    roots: Vec<Certificate>,
    warnings: Vec<ResolveWarning>,
    fetches: usize,
    truncated: bool,
}

impl ResolutionRun {
    fn new(leaf: Certificate, options: ResolverOptions) -> Self {
        let mut dedup = Deduplicator::new();
        dedup.observe(&leaf);

        let mut queue = VecDeque::new();
        queue.push_back(leaf.clone());

        Self {
            options,
            known_subjects: vec![leaf.clone()],
            leaf,
            dedup,
            queue,
            visited: HashSet::new(),
            bundle: Bundle::new(),
            roots: Vec::new(),
            warnings: Vec::new(),
            fetches: 0,
            truncated: false,
        }
    }

    fn admit(&mut self, cert: Certificate, origin: Origin) -> Admission {
        if self.dedup.observe(&cert) == Observation::Duplicate {
            tracing::debug!("Discarding duplicate {}", cert);
            return Admission::Duplicate;
        }

        self.known_subjects.push(cert.clone());

        if cert.is_self_signed() {
            tracing::info!("Found root {}", cert.subject());
            if self.options.include_roots {
                self.bundle.push(cert.clone(), origin);
            }
            self.roots.push(cert);
            return Admission::Root;
        }

        tracing::info!("Added intermediate {}", cert.subject());
        self.bundle.push(cert.clone(), origin);
        self.queue.push_back(cert);
        Admission::Added
    }

    fn issuer_known(&self, cert: &Certificate) -> bool {
        self.known_subjects
            .iter()
            .any(|known| known != cert && cert.is_issued_by(known))
            || cert.is_self_signed()
    }

    fn fetch_budget_exhausted(&self) -> bool {
        self.options
            .max_fetches
            .is_some_and(|limit| self.fetches >= limit)
    }

    fn truncate(&mut self) {
        if !self.truncated {
            let limit = self.options.max_fetches.unwrap_or(self.fetches);
            tracing::warn!("Fetch limit of {} reached, stopping AIA walk", limit);
            self.warnings
                .push(ResolveWarning::FetchLimitReached { limit });
            self.truncated = true;
        }
    }

    fn finish(mut self) -> Resolution {
        if self.bundle.is_empty() {
            self.warnings.push(ResolveWarning::EmptyBundle);
        }

        tracing::debug!(
            "Resolution done: {} observed, {} unique, {} duplicates, {} fetches",
            self.dedup.total_seen(),
            self.dedup.unique_count(),
            self.dedup.duplicates_filtered(),
            self.fetches
        );

        Resolution {
            leaf: self.leaf,
            bundle: self.bundle,
            roots: self.roots,
            warnings: self.warnings,
            fetches: self.fetches,
            truncated: self.truncated,
        }
    }
}
