// ConfigExampleCommand - Write a configuration file with default values
// Licensed under GPL-3.0

use super::Command;
use crate::Result;
use crate::config::ResolverConfig;
use async_trait::async_trait;
use colored::Colorize;
use std::path::PathBuf;

pub struct ConfigExampleCommand {
    path: PathBuf,
}

impl ConfigExampleCommand {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Command for ConfigExampleCommand {
    async fn execute(&self) -> Result<()> {
        ResolverConfig::create_example(&self.path)?;
        println!(
            "{} Example configuration written to {}",
            "✓".green(),
            self.path.display()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConfigExampleCommand"
    }
}
