//! Placeholder substitution for SQL templates.
//!
//! Statement bodies reference parameters as `#{name}`. [`prepare`] replaces
//! every placeholder whose name matches a parameter key, compared
//! case-insensitively, with the rendered parameter value:
//!
//! - text values are wrapped in single quotes: `#{name}` → `'ann'`
//! - numbers and booleans are inserted as-is: `#{age}` → `5`
//! - null is inserted as `NULL`
//!
//! Placeholders without a matching key are left untouched.
//!
//! # Caller responsibility
//!
//! This is textual substitution, not parameter binding. Quotes inside text
//! values are **not** escaped, so a value such as `O'Brien` produces invalid SQL
//! and untrusted input can inject SQL. Callers must validate or escape values
//! before passing them in.
//!
//! # Examples
//!
//! ```rust
//! use statement_registry::templating::{Params, prepare};
//!
//! let mut params = Params::new();
//! params.insert("name".to_string(), "ann".into());
//! params.insert("age".to_string(), 5.into());
//!
//! let sql = prepare("SELECT * FROM t WHERE name=#{name} AND age=#{age}", Some(&params)).unwrap();
//! assert_eq!(sql, "SELECT * FROM t WHERE name='ann' AND age=5");
//! ```

mod params;

pub use params::{ParamValue, Params, params_from_json};

use regex::{NoExpand, Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::trace;

use crate::core::RegistryError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\{([^{}]*)\}").expect("placeholder pattern is valid"));

/// Substitute `params` into `sql`.
///
/// Keys are applied one at a time in the map's insertion order. Each key
/// replaces all of its occurrences in one pass. With `None`, `sql` is returned
/// unchanged.
///
/// # Errors
///
/// Returns [`RegistryError::Template`] if a key cannot be compiled into a
/// matcher, for example because it exceeds the regex size limit.
pub fn prepare(sql: &str, params: Option<&Params>) -> Result<String, RegistryError> {
    let Some(params) = params else {
        return Ok(sql.to_string());
    };

    let mut prepared = sql.to_string();
    for (key, value) in params {
        let matcher = RegexBuilder::new(&regex::escape(&format!("#{{{key}}}")))
            .case_insensitive(true)
            .build()
            .map_err(|e| RegistryError::Template {
                key: key.clone(),
                message: e.to_string(),
            })?;

        let rendered = value.to_sql_literal();
        prepared = matcher.replace_all(&prepared, NoExpand(&rendered)).into_owned();
    }

    trace!("Prepared SQL: {prepared}");
    Ok(prepared)
}

/// Distinct placeholder names in `sql`, in first-occurrence order.
///
/// Names are returned as written; `#{Name}` and `#{name}` are reported once,
/// using the first spelling.
#[must_use]
pub fn placeholders(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in PLACEHOLDER.captures_iter(sql) {
        let name = &capture[1];
        if !names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    names
}
