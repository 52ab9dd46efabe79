// Commands module - Command Pattern implementation
// Licensed under GPL-3.0

mod command;
mod router;

mod config_example;
mod resolve;

pub use command::Command;
pub use router::CommandRouter;

pub use config_example::ConfigExampleCommand;
pub use resolve::{ResolveCommand, ResolveOutcome};
