//! Generic configuration parsing utilities.
//!
//! Reads a TOML file and deserializes it into any `DeserializeOwned` type,
//! attaching the file path to both read and parse failures.
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /srv/app/statement-registry.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// # Examples
///
/// ```rust,no_run
/// use statement_registry::config::{RegistryConfig, parse_config};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: RegistryConfig = parse_config(Path::new("statement-registry.toml"))?;
/// println!("Mapper root: {}", config.root.display());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content does not match `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        use tempfile::tempdir;

        let temp = tempdir().unwrap();
        let config_path = temp.path().join("test.toml");

        #[derive(serde::Deserialize)]
        struct TestConfig {
            name: String,
            value: i32,
        }

        let toml_content = r#"
            name = "test"
            value = 42
        "#;

        std::fs::write(&config_path, toml_content).unwrap();

        let config: TestConfig = parse_config(&config_path).unwrap();
        assert_eq!(config.name, "test");
        assert_eq!(config.value, 42);
    }

    #[test]
    fn test_parse_config_reports_path() {
        let temp = tempfile::tempdir().unwrap();
        let config_path = temp.path().join("broken.toml");
        std::fs::write(&config_path, "root = ").unwrap();

        let err = parse_config::<toml::Table>(&config_path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));

        let err = parse_config::<toml::Table>(&temp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
