// CommandRouter - Routes CLI arguments to appropriate Command
// Licensed under GPL-3.0

use super::{Command, ConfigExampleCommand, ResolveCommand};
use crate::{Args, Result};

/// CommandRouter determines which Command to execute based on CLI arguments
///
/// 1. Example configuration (--config-example)
/// 2. Chain resolution for a target (default)
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    ///
    /// # Errors
    /// Fails when the arguments do not describe a runnable command,
    /// e.g. no target was given.
    pub fn route(args: Args) -> Result<Box<dyn Command>> {
        args.validate()?;

        if let Some(path) = args.config_example.clone() {
            return Ok(Box::new(ConfigExampleCommand::new(path)));
        }

        Ok(Box::new(ResolveCommand::new(args)))
    }
}
