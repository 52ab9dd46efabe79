// JSON Output Module

use crate::certificates::bundle::{BundleEntrySummary, WriteStats};
use crate::certificates::parser::CertificateSummary;
use crate::commands::ResolveOutcome;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Machine-readable record of one resolution run
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub target: String,
    pub hostname: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    pub leaf: CertificateSummary,
    pub bundle: Vec<BundleEntrySummary>,
    pub roots: Vec<CertificateSummary>,
    pub warnings: Vec<String>,
    pub fetches: usize,
    pub truncated: bool,
    pub output: String,
    pub written: WriteStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_bundle: Option<String>,
}

impl ResolutionReport {
    pub fn from_outcome(outcome: &ResolveOutcome) -> Self {
        let resolution = &outcome.resolution;

        Self {
            target: outcome.target.to_string(),
            hostname: outcome.target.hostname.clone(),
            port: outcome.target.port,
            peer: outcome.peer.map(|addr| addr.to_string()),
            leaf: resolution.leaf.summary(),
            bundle: resolution.bundle.summaries(),
            roots: resolution.roots.iter().map(|c| c.summary()).collect(),
            warnings: resolution.warnings.iter().map(|w| w.to_string()).collect(),
            fetches: resolution.fetches,
            truncated: resolution.truncated,
            output: outcome.output.describe(),
            written: outcome.stats,
            system_bundle: outcome
                .system_bundle
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }

    /// Generate JSON output
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }

    /// Write pretty JSON to file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json(true)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write JSON report to {}", path.display()))?;
        Ok(())
    }
}
