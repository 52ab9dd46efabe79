// Output module - Terminal summary and JSON report of a resolution run

pub mod json;

use crate::certificates::bundle::{BundleEntry, Origin, OutputTarget};
use crate::commands::ResolveOutcome;
use crate::error::ResolveWarning;
use colored::*;
use std::fmt::Write;

const SUBJECT_WIDTH: usize = 72;

/// Truncate a string with ellipsis if it exceeds max length
fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

fn section_header(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.cyan().bold());
    let _ = writeln!(out, "{}", "=".repeat(50));
}

fn format_origin(origin: &Origin) -> String {
    match origin {
        Origin::Presented { position } => format!("presented by server (#{})", position),
        Origin::Aia { uri, .. } => format!("fetched from {}", uri),
    }
}

fn format_warning(warning: &ResolveWarning) -> ColoredString {
    match warning {
        ResolveWarning::EmptyBundle | ResolveWarning::FetchLimitReached { .. } => {
            warning.to_string().yellow().bold()
        }
        _ => warning.to_string().yellow(),
    }
}

/// Renders a `ResolveOutcome` for the terminal
///
/// Colors follow the global `colored` override, which `main` sets from
/// `--no-color`.
#[derive(Debug, Default)]
pub struct ResolutionFormatter;

impl ResolutionFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, outcome: &ResolveOutcome) -> String {
        let mut out = String::new();
        let resolution = &outcome.resolution;

        let _ = write!(out, "{} {}", "Target:".bold(), outcome.target);
        if let Some(peer) = outcome.peer {
            let _ = write!(out, " ({})", peer.ip());
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "{} {}",
            "Leaf:".bold(),
            truncate_with_ellipsis(resolution.leaf.subject(), SUBJECT_WIDTH)
        );

        section_header(&mut out, "Intermediate Bundle");
        if resolution.is_empty() {
            let _ = writeln!(out, "  {}", "(empty)".dimmed());
        }
        for (index, entry) in resolution.bundle.entries().iter().enumerate() {
            self.render_entry(&mut out, index + 1, entry);
        }

        if !resolution.roots.is_empty() {
            section_header(&mut out, "Root Candidates");
            for root in &resolution.roots {
                let _ = writeln!(
                    out,
                    "  {} {}",
                    "•".blue(),
                    truncate_with_ellipsis(root.subject(), SUBJECT_WIDTH)
                );
            }
        }

        if !resolution.warnings.is_empty() {
            section_header(&mut out, "Warnings");
            for warning in &resolution.warnings {
                let _ = writeln!(out, "  {} {}", "!".yellow().bold(), format_warning(warning));
            }
        }

        section_header(&mut out, "Summary");
        let _ = writeln!(
            out,
            "  Intermediates: {}",
            outcome.stats.intermediates.to_string().green().bold()
        );
        if let Some(path) = &outcome.system_bundle {
            let _ = writeln!(
                out,
                "  Merged from system bundle: {} ({})",
                outcome.stats.merged,
                path.display()
            );
        }
        let _ = writeln!(out, "  AIA fetches:   {}", resolution.fetches);
        if resolution.truncated {
            let _ = writeln!(out, "  {}", "Walk truncated by fetch limit".yellow());
        }
        let destination = match &outcome.output {
            OutputTarget::Stdout => "stdout".to_string(),
            OutputTarget::File(path) => path.display().to_string(),
        };
        let _ = writeln!(
            out,
            "  Written to:    {} ({} bytes)",
            destination, outcome.stats.bytes
        );

        out
    }

    fn render_entry(&self, out: &mut String, index: usize, entry: &BundleEntry) {
        let cert = &entry.certificate;
        let marker = if cert.is_self_signed() {
            "root".magenta()
        } else {
            "intermediate".green()
        };

        let _ = writeln!(
            out,
            "  [{}] {} {}",
            index,
            truncate_with_ellipsis(cert.subject(), SUBJECT_WIDTH).bold(),
            marker
        );
        let _ = writeln!(
            out,
            "      Issuer:  {}",
            truncate_with_ellipsis(cert.issuer(), SUBJECT_WIDTH)
        );
        let _ = writeln!(out, "      SHA-256: {}", cert.fingerprint_colon());
        let _ = writeln!(out, "      Expires: {}", cert.not_after());
        let _ = writeln!(out, "      Origin:  {}", format_origin(&entry.origin).dimmed());
    }
}
