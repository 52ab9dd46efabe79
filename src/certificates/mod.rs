// Certificates module - Chain capture, AIA resolution and bundle output

pub mod bundle;
pub mod capture;
pub mod dedup;
pub mod fetcher;
pub mod parser;
pub mod resolver;
pub mod trust_store;

pub use bundle::{Bundle, BundleEntry, BundleWriter, Origin, OutputTarget, WriteStats};
pub use capture::{CapturedChain, ChainCapture};
pub use dedup::{Deduplicator, Observation};
pub use fetcher::{HttpFetcher, IssuerFetcher};
pub use parser::{Certificate, CertificateSummary};
pub use resolver::{ChainResolver, Resolution, ResolverOptions};
