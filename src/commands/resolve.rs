// ResolveCommand - Capture a server's chain and build the intermediate bundle
// Licensed under GPL-3.0

use super::Command;
use crate::certificates::bundle::{BundleWriter, OutputTarget, WriteStats};
use crate::certificates::capture::{self, ChainCapture};
use crate::certificates::fetcher::HttpFetcher;
use crate::certificates::resolver::{ChainResolver, Resolution};
use crate::certificates::trust_store;
use crate::config::ResolverConfig;
use crate::output::ResolutionFormatter;
use crate::output::json::ResolutionReport;
use crate::utils::network::Target;
use crate::{Args, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub target: Target,
    /// Address the capture handshake completed against
    pub peer: Option<std::net::SocketAddr>,
    pub resolution: Resolution,
    pub output: OutputTarget,
    pub stats: WriteStats,
    /// System bundle that was merged into the output, if any
    pub system_bundle: Option<PathBuf>,
}

/// ResolveCommand runs one capture → AIA walk → write pipeline
///
/// Capture failures, missing certificates, hostname mismatches and output
/// I/O errors abort the run. Fetch failures and malformed certificates only
/// show up as warnings in the outcome.
pub struct ResolveCommand {
    args: Args,
}

impl ResolveCommand {
    /// Create a new ResolveCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }

    /// Run the pipeline without printing anything
    pub async fn run(&self) -> Result<ResolveOutcome> {
        let input = self
            .args
            .target
            .as_deref()
            .context("No target specified")?;
        let config = self.args.resolve_config()?;

        let target = Target::parse(input).await?;
        Self::run_with(target, &config).await
    }

    /// Run the pipeline against an already resolved target
    pub async fn run_with(target: Target, config: &ResolverConfig) -> Result<ResolveOutcome> {
        let capture = ChainCapture::new(config.connect_timeout(), config.handshake_timeout())?;
        let captured = capture.capture(&target).await?;

        let leaf = captured
            .leaf()
            .context("captured chain has no leaf certificate")?;
        tracing::info!(
            "{} presented {} certificate(s), leaf {}",
            target,
            captured.certificates.len(),
            leaf.subject()
        );

        if config.verify_hostname {
            capture::verify_hostname(leaf, &target.hostname)?;
        }

        let fetcher = HttpFetcher::new(config.fetch_timeout())?
            .with_max_response_bytes(config.max_response_bytes);
        let resolver = ChainResolver::new(fetcher, config.to_resolver_options());
        let mut resolution = resolver.resolve(&captured.certificates).await?;

        // Capture warnings come first so the report reads in pipeline order
        resolution.warnings.splice(0..0, captured.warnings);

        let output = OutputTarget::from_arg(&config.output);
        let mut writer = BundleWriter::new(output.clone());
        let mut system_bundle = None;

        if config.merge_system_bundle {
            let (path, certificates) =
                trust_store::load_system_bundle(config.system_bundle.as_deref())?;
            writer = writer.with_merged(certificates);
            system_bundle = Some(path);
        }

        let stats = writer.write(&resolution.bundle)?;

        Ok(ResolveOutcome {
            target,
            peer: captured.peer,
            resolution,
            output,
            stats,
            system_bundle,
        })
    }
}

#[async_trait]
impl Command for ResolveCommand {
    async fn execute(&self) -> Result<()> {
        let outcome = self.run().await?;

        let formatter = ResolutionFormatter::new();
        let summary = formatter.render(&outcome);

        // Keep stdout clean for the PEM when the bundle goes there
        if outcome.output == OutputTarget::Stdout {
            eprint!("{}", summary);
        } else {
            print!("{}", summary);
        }

        if let Some(path) = &self.args.output.json {
            ResolutionReport::from_outcome(&outcome).write_file(path)?;
            tracing::info!("JSON report written to {}", path.display());
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ResolveCommand"
    }
}
