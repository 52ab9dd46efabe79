// Bundle and report output arguments
// Licensed under GPL-3.0

use clap::Args;
use std::path::PathBuf;

/// Bundle output and reporting options
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Bundle output file ("-" for stdout) [default: ca-bundle.pem]
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<String>,

    /// Include self-signed root certificates in the bundle
    #[arg(long = "include-roots")]
    pub include_roots: bool,

    /// Append the system trust bundle after the intermediates
    #[arg(long = "merge-system-bundle")]
    pub merge_system_bundle: bool,

    /// System trust bundle to merge (implies --merge-system-bundle)
    #[arg(long = "system-bundle", value_name = "FILE")]
    pub system_bundle: Option<PathBuf>,

    /// Write a JSON report of the resolution
    #[arg(long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Disable colored terminal output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
