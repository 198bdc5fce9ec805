//! Follow the mapper directory until interrupted.
//!
//! Cache updates are logged at `info`; `--quiet` hides them.
//!
//! ```bash
//! stmtreg --root ./mappers watch
//! ```

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::registry::StatementRegistry;

#[derive(Args, Debug)]
pub struct WatchCommand {}

impl WatchCommand {
    pub async fn execute(self, registry: &StatementRegistry) -> Result<()> {
        registry.start_watching().await?;
        info!("Loaded mappers: {}", registry.cache().names().join(", "));

        tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;

        registry.shutdown().await;
        Ok(())
    }
}
