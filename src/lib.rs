//! Statement registry: named SQL statements from XML mapper files.
//!
//! Applications keep their SQL in mapper files, one file per domain area, and
//! look statements up by file name and statement id. Lookups return SQL text
//! with `#{name}` placeholders substituted. Nothing is executed.
//!
//! # Architecture Overview
//!
//! ```text
//! mapper files ──► mapper::decode ──► MapperDocument ──► StatementIndex
//!                                         │                    │
//!                      on-demand lookups ─┘      registry::RegistryCache
//!                                                              │
//!                                       registry::Watcher keeps it current
//! ```
//!
//! - **Cached lookups** read a flattened per-file index kept in sync with the
//!   mapper directory by a filesystem watcher.
//! - **Kind-specific lookups** re-read the mapper file on every call and require
//!   exactly one statement of the requested kind with the requested id.
//!
//! # Mapper Format
//!
//! ```xml
//! <mapper>
//!   <select id="findUser">SELECT * FROM users WHERE name = #{name}</select>
//!   <insert id="addUser">INSERT INTO users (name) VALUES (#{name})</insert>
//!   <update id="renameUser">UPDATE users SET name = #{name} WHERE id = #{id}</update>
//!   <delete id="removeUser">DELETE FROM users WHERE id = #{id}</delete>
//! </mapper>
//! ```
//!
//! # Core Modules
//!
//! - [`mapper`] - Mapper file decoding and the per-file statement index
//! - [`registry`] - The registry, its cache, and the filesystem watcher
//! - [`templating`] - Placeholder substitution and parameter values
//! - [`config`] - Registry settings and `statement-registry.toml` loading
//! - [`core`] - Error types and user-facing error rendering
//! - [`cli`] - The `stmtreg` command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use statement_registry::{Params, RegistryConfig, StatementRegistry};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = StatementRegistry::init(RegistryConfig::new("mappers").with_watch(true)).await?;
//!
//! let mut params = Params::new();
//! params.insert("name".to_string(), "ann".into());
//! let sql = registry.get_statement("users", "findUser", Some(&params))?;
//! assert_eq!(sql, "SELECT * FROM users WHERE name = 'ann'");
//!
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Substitution is textual. Text values are wrapped in single quotes without
//! escaping, so parameter values must never come from untrusted input.

pub mod cli;
pub mod config;
pub mod core;
pub mod mapper;
pub mod registry;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::RegistryConfig;
pub use core::RegistryError;
pub use mapper::StatementKind;
pub use registry::{MapperRequest, StatementRegistry};
pub use templating::{ParamValue, Params, prepare};
