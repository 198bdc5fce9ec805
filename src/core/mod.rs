//! Core types shared across the registry
//!
//! This module holds the error system used by every other module:
//! - [`RegistryError`] - Enumerated error types covering all registry failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//!
//! # Examples
//!
//! ```rust
//! use statement_registry::core::{RegistryError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(RegistryError::Config { message: "root is not set".to_string() }.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, RegistryError, similar_names, user_friendly_error};

/// Result alias used by the library API
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
