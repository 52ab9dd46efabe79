// cabundler - Recover missing intermediate CA certificates via AIA
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

use anyhow::Result;
use cabundler::Args;
use cabundler::commands::CommandRouter;
use clap::Parser;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Capture builds its config with an explicit provider; this covers everything else
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Initialize logging - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if args.output.no_color {
        colored::control::set_override(false);
    }

    let command = CommandRouter::route(args)?;
    debug!("Running {}", command.name());
    command.execute().await
}
