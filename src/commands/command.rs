// Command trait - Interface shared by every operational mode
// Licensed under GPL-3.0

use crate::Result;
use async_trait::async_trait;

/// A single operational mode of cabundler, selected by `CommandRouter`
#[async_trait]
pub trait Command: Send + Sync {
    /// Execute the command asynchronously
    async fn execute(&self) -> Result<()>;

    /// Get a human-readable name for this command (for logging/debugging)
    fn name(&self) -> &'static str;
}
