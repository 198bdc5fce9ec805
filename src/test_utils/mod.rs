//! Test utilities for the statement registry
//!
//! This module provides helpers for tests that need mapper files on disk:
//! - [`MapperDir`] owns a temporary mapper root and writes files into it
//! - [`MapperFixture`] holds sample mapper documents
//! - [`init_test_logging`] installs a test-friendly `tracing` subscriber once
//!
//! # Example
//!
//! ```rust,no_run
//! use statement_registry::StatementRegistry;
//! use statement_registry::test_utils::{MapperDir, MapperFixture};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let dir = MapperDir::new()?;
//! dir.add(&MapperFixture::users())?;
//!
//! let registry = StatementRegistry::new(dir.config())?;
//! let sql = registry.get_delete_statement("users", "removeUser", None).await?;
//! assert_eq!(sql, "DELETE FROM users WHERE id = #{id}");
//! # Ok(())
//! # }
//! ```

pub mod fixtures;

pub use fixtures::MapperFixture;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::RegistryConfig;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// This function initializes the tracing subscriber for tests, but only once
/// regardless of how many times it's called. It respects the `RUST_LOG` environment
/// variable if set, or uses the provided log level.
///
/// # Arguments
///
/// * `level` - Optional log level to use. If None, uses `RUST_LOG` environment variable
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            // No logging if neither is provided
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Temporary mapper root. Removed when dropped.
#[derive(Debug)]
pub struct MapperDir {
    temp: TempDir,
    extension: String,
}

impl MapperDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: TempDir::new().context("Failed to create temporary mapper root")?,
            extension: crate::config::DEFAULT_EXTENSION.to_string(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Path a mapper named `name` is written to.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(format!("{name}.{}", self.extension))
    }

    /// Write `content` as mapper `name`, creating parent directories for
    /// names like `nested/users`.
    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write a fixture under its own name.
    pub fn add(&self, fixture: &MapperFixture) -> Result<PathBuf> {
        self.write(&fixture.name, &fixture.content)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        std::fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))
    }

    /// Registry config rooted here, watching disabled.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig::new(self.root())
    }
}
