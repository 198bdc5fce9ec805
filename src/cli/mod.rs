//! Command-line interface for the statement registry.
//!
//! The `stmtreg` binary is a thin shell over [`crate::registry`]: it loads a
//! [`RegistryConfig`], builds a [`StatementRegistry`], and runs one command.
//!
//! # Available Commands
//!
//! - `get` - Print a prepared statement
//! - `list` - List mapper files, or the statements of one mapper
//! - `check` - Validate mapper files for decode errors and duplicate ids
//! - `watch` - Follow the mapper directory and log cache updates until Ctrl-C
//!
//! # Configuration
//!
//! The registry config is resolved in this order:
//! 1. `--config <file>`
//! 2. `statement-registry.toml` in the current directory, if present
//! 3. `--root <dir>` alone, with default settings
//!
//! `--root` (or `STMTREG_ROOT`) always overrides the root from a config file.
//!
//! # Example
//!
//! ```bash
//! stmtreg --root ./mappers list
//! stmtreg --root ./mappers get users findUser --kind select --param id=7
//! stmtreg -c ./statement-registry.toml check
//! ```

mod check;
mod get;
mod list;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CONFIG_FILE, RegistryConfig};
use crate::core::{ErrorContext, RegistryError};
use crate::registry::StatementRegistry;

/// Runtime configuration for CLI execution.
///
/// Collects what the global flags decide so commands and tests can run
/// without touching process-wide state.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive used when `RUST_LOG` is unset. `None` keeps the default.
    pub log_level: Option<String>,

    /// Explicit config file from `--config`.
    pub config_path: Option<PathBuf>,

    /// Root override from `--root`.
    pub root: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the registry config for this invocation, looking for the
    /// default config file in `cwd`.
    ///
    /// # Errors
    ///
    /// Fails if a config file cannot be loaded, or if neither a config file
    /// nor a root is available.
    pub fn registry_config(&self, cwd: &Path) -> Result<RegistryConfig> {
        let default_file = cwd.join(DEFAULT_CONFIG_FILE);

        let mut config = if let Some(path) = &self.config_path {
            RegistryConfig::load_from(path)?
        } else if default_file.is_file() {
            RegistryConfig::load_from(&default_file)?
        } else if let Some(root) = &self.root {
            RegistryConfig::new(root)
        } else {
            return Err(ErrorContext::new(RegistryError::Config {
                message: "no mapper directory configured".to_string(),
            })
            .with_suggestion(format!("Pass --root <dir>, set STMTREG_ROOT, or create {DEFAULT_CONFIG_FILE}"))
            .into());
        };

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        config.validate()?;

        Ok(config)
    }

    /// Install the global `tracing` subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise the level chosen by the flags is
    /// used. Logs go to stderr so command output stays pipeable.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("info"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// SQL statement registry: resolve statements from XML mapper files.
#[derive(Parser)]
#[command(name = "stmtreg", about = "Resolve SQL statements from XML mapper files", version, author)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a registry config file (defaults to ./statement-registry.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Mapper directory; overrides `root` from the config file
    #[arg(long, global = true, env = "STMTREG_ROOT")]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a prepared statement
    Get(get::GetCommand),

    /// List mapper files, or the statements of one mapper
    List(list::ListCommand),

    /// Validate mapper files
    Check(check::CheckCommand),

    /// Watch the mapper directory until interrupted
    Watch(watch::WatchCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            root: self.root.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let cwd = std::env::current_dir()?;
        let registry = StatementRegistry::new(config.registry_config(&cwd)?)?;

        match self.command {
            Commands::Get(cmd) => cmd.execute(&registry).await,
            Commands::List(cmd) => cmd.execute(&registry).await,
            Commands::Check(cmd) => cmd.execute(&registry).await,
            Commands::Watch(cmd) => cmd.execute(&registry).await,
        }
    }
}
