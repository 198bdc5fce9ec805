//! Registry configuration.
//!
//! A registry needs to know where mapper files live, whether to watch that
//! directory, and which extension identifies a mapper file. The settings can be
//! built in code or loaded from a TOML file (`statement-registry.toml` by
//! default):
//!
//! ```toml
//! root = "mappers"     # directory containing mapper files
//! watch = true         # keep the cache in sync with the directory
//! extension = "xml"    # mapper file extension, without the dot
//! ```
//!
//! A relative `root` in a config file is resolved against the directory that
//! contains the file, so the same file works from any working directory.
//!
//! # Examples
//!
//! ```rust
//! use statement_registry::config::RegistryConfig;
//!
//! let config = RegistryConfig::new("mappers").with_watch(true);
//! assert_eq!(config.extension, "xml");
//! assert!(config.watch);
//! ```

mod parser;

pub use parser::parse_config;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::RegistryError;

/// File name looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "statement-registry.toml";

/// Default mapper file extension.
pub const DEFAULT_EXTENSION: &str = "xml";

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn is_default_extension(extension: &str) -> bool {
    extension == DEFAULT_EXTENSION
}

/// Settings for a [`crate::registry::StatementRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory containing mapper files.
    pub root: PathBuf,

    /// Start the filesystem watcher when the registry is initialized.
    ///
    /// Without a watcher the cache stays empty and only kind-specific lookups,
    /// which read from disk, can succeed.
    #[serde(default)]
    pub watch: bool,

    /// Mapper file extension without the leading dot.
    #[serde(default = "default_extension", skip_serializing_if = "is_default_extension")]
    pub extension: String,
}

impl RegistryConfig {
    /// Config for `root` with watching disabled and the default extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            watch: false,
            extension: default_extension(),
        }
    }

    #[must_use]
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Set the mapper extension. A leading dot is accepted and stripped.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = extension.strip_prefix('.').map(str::to_string).unwrap_or(extension);
        self
    }

    /// Load a config file and resolve a relative `root` against its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting config fails [`validate`](Self::validate).
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config: Self = parse_config(path)?;

        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        let extension = config.extension.clone();
        config = config.with_extension(extension);
        config.validate()?;

        Ok(config)
    }

    /// Check that the config can drive a registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] for an empty root or extension, or an
    /// extension containing a path separator.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.root.as_os_str().is_empty() {
            return Err(RegistryError::Config {
                message: "root directory is empty".to_string(),
            });
        }
        if self.extension.is_empty() {
            return Err(RegistryError::Config {
                message: "mapper extension is empty".to_string(),
            });
        }
        if self.extension.contains(['/', '\\', '.']) {
            return Err(RegistryError::Config {
                message: format!("invalid mapper extension '{}'", self.extension),
            });
        }
        Ok(())
    }

    /// Path of the mapper file named `mapper` under the root.
    #[must_use]
    pub fn mapper_path(&self, mapper: &str) -> PathBuf {
        self.root.join(format!("{mapper}.{}", self.extension))
    }
}
