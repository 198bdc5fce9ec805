//! Error handling for the statement registry
//!
//! This module provides the error type returned by every fallible registry
//! operation, plus user-friendly rendering for the CLI. The error system is
//! designed around two core principles:
//! 1. **Strongly-typed errors** so callers can match on the exact failure
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`RegistryError`] - Enumerated error types for all failure cases
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! - **Mapper files**: [`RegistryError::Decode`], [`RegistryError::Io`]
//! - **Resolution**: [`RegistryError::StatementNotFound`], [`RegistryError::StatementDuplicate`]
//! - **Setup**: [`RegistryError::Config`], [`RegistryError::Watch`]
//!
//! All resolution errors are terminal for the call that produced them. There is
//! no retry and no partial result.
//!
//! # Examples
//!
//! ```rust,no_run
//! use statement_registry::core::{RegistryError, user_friendly_error};
//!
//! fn lookup() -> Result<String, RegistryError> {
//!     Err(RegistryError::StatementNotFound {
//!         mapper_file: "users".to_string(),
//!         kind: None,
//!         id: "findUser".to_string(),
//!     })
//! }
//!
//! if let Err(e) = lookup() {
//!     let ctx = user_friendly_error(anyhow::Error::from(e));
//!     ctx.display(); // Shows colored error with suggestions
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::mapper::StatementKind;

/// The main error type for registry operations
///
/// # Error Categories
///
/// ## Mapper files
/// - [`Decode`] - The mapper markup is malformed
/// - [`Io`] - The mapper file is missing or unreadable
///
/// ## Resolution
/// - [`StatementNotFound`] - No statement matches the lookup
/// - [`StatementDuplicate`] - More than one statement matches a kind-specific lookup
/// - [`Template`] - A parameter key cannot be matched against placeholders
///
/// ## Setup
/// - [`Config`] - Invalid registry configuration
/// - [`Watch`] - The filesystem watcher could not be started
///
/// # Examples
///
/// ```rust,no_run
/// use statement_registry::core::RegistryError;
///
/// fn handle_error(error: RegistryError) {
///     match error {
///         RegistryError::StatementDuplicate { mapper_file, id, .. } => {
///             eprintln!("{mapper_file} declares '{id}' more than once");
///         }
///         RegistryError::Io { path, .. } => {
///             eprintln!("cannot read {}", path.display());
///         }
///         _ => eprintln!("{error}"),
///     }
/// }
/// ```
///
/// [`Decode`]: RegistryError::Decode
/// [`Io`]: RegistryError::Io
/// [`StatementNotFound`]: RegistryError::StatementNotFound
/// [`StatementDuplicate`]: RegistryError::StatementDuplicate
/// [`Template`]: RegistryError::Template
/// [`Config`]: RegistryError::Config
/// [`Watch`]: RegistryError::Watch
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Mapper markup could not be decoded
    ///
    /// Raised for malformed XML, unbalanced tags, a missing root element, or a
    /// statement element without an `id` attribute.
    #[error("Failed to decode mapper {source_name}: {message}")]
    Decode {
        /// File path or label of the document being decoded
        source_name: String,
        /// Decoder message
        message: String,
    },

    /// Mapper file is missing or unreadable
    #[error("Failed to read mapper file {}", path.display())]
    Io {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No statement matches the lookup
    ///
    /// `kind` is `None` for cache-backed lookups, which do not distinguish kinds.
    #[error("No SQL statement: {}", qualified_name(mapper_file, *kind, id))]
    StatementNotFound {
        /// Mapper file base name
        mapper_file: String,
        /// Statement kind, when the lookup was kind-specific
        kind: Option<StatementKind>,
        /// Requested statement id
        id: String,
    },

    /// More than one statement of the same kind shares the requested id
    #[error(
        "SQL statement is duplicated: {} ({count} definitions)",
        qualified_name(mapper_file, Some(*kind), id)
    )]
    StatementDuplicate {
        /// Mapper file base name
        mapper_file: String,
        /// Statement kind
        kind: StatementKind,
        /// Duplicated statement id
        id: String,
        /// Number of matching definitions
        count: usize,
    },

    /// A parameter key could not be turned into a placeholder matcher
    #[error("Invalid template parameter '{key}': {message}")]
    Template {
        /// Offending parameter key
        key: String,
        /// Matcher build error
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Filesystem watcher failed
    #[error("File watcher error: {message}")]
    Watch {
        /// Description of the watcher failure
        message: String,
    },

    /// Any other failure surfaced through the CLI
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

fn qualified_name(mapper_file: &str, kind: Option<StatementKind>, id: &str) -> String {
    match kind {
        Some(kind) => format!("{mapper_file}.{kind}.{id}"),
        None => format!("{mapper_file}.{id}"),
    }
}

impl From<notify::Error> for RegistryError {
    fn from(err: notify::Error) -> Self {
        Self::Watch {
            message: err.to_string(),
        }
    }
}

/// Error wrapper that adds user-facing suggestions and details
///
/// Suggestions are actionable steps (shown in green), details explain why the
/// error occurred (shown in yellow).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying registry error
    pub error: RegistryError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details
    #[must_use]
    pub const fn new(error: RegistryError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with tailored suggestions
///
/// An [`ErrorContext`] returned as an error passes through untouched.
/// [`RegistryError`]s anywhere in the chain get specific suggestions. Plain
/// I/O and TOML errors get generic ones. Everything else is wrapped as
/// [`RegistryError::Other`] carrying the full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Commands may attach their own suggestions before returning
    let error = match error.downcast::<ErrorContext>() {
        Ok(ctx) => return ctx,
        Err(error) => error,
    };

    let error = match error.downcast::<RegistryError>() {
        Ok(registry_error) => return create_error_context(registry_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let message = format!("{error:#}");
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(RegistryError::Other { message })
                    .with_suggestion("Check the ownership and permissions of the mapper directory");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(RegistryError::Other { message })
                    .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(RegistryError::Config {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your statement-registry.toml")
        .with_details("Expected keys are `root`, `watch` and `extension`");
    }

    ErrorContext::new(RegistryError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: RegistryError) -> ErrorContext {
    match &error {
        RegistryError::Decode { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the mapper file is well-formed XML with a single root element and that every statement has an `id` attribute"),
        RegistryError::Io { path, source } => {
            let suggestion = match source.kind() {
                std::io::ErrorKind::NotFound => format!(
                    "Check that {} exists and that the registry root points at the mapper directory",
                    path.display()
                ),
                std::io::ErrorKind::PermissionDenied => {
                    format!("Check read permissions on {}", path.display())
                }
                _ => "Check that the mapper file is readable".to_string(),
            };
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        RegistryError::StatementNotFound { kind: None, .. } => ErrorContext::new(error)
            .with_suggestion("Make sure the registry is watching the mapper directory, or pass --kind to read the mapper file from disk")
            .with_details("Cached lookups only see mapper files the watcher has observed"),
        RegistryError::StatementNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the statement id and its element name (select, insert, update, delete)"),
        RegistryError::StatementDuplicate { .. } => ErrorContext::new(error)
            .with_suggestion("Rename or remove the extra definitions so each id is unique within its kind"),
        RegistryError::Template { .. } => ErrorContext::new(error)
            .with_suggestion("Use short parameter names that match the #{name} placeholders in the statement"),
        RegistryError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Set `root` in statement-registry.toml or pass --root"),
        RegistryError::Watch { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the mapper directory exists and that the platform file watcher limit has not been reached"),
        RegistryError::Other { .. } => ErrorContext::new(error),
    }
}

/// Rank `candidates` by similarity to `wanted` and return the closest few
///
/// Used to build "did you mean" suggestions for missing statement ids.
#[must_use]
pub fn similar_names<'a, I>(wanted: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = wanted.to_lowercase();
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(&wanted, &candidate.to_lowercase()), candidate))
        .filter(|(score, _)| *score >= 0.8)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(3).map(|(_, name)| name.to_string()).collect()
}
