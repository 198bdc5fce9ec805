//! Print a prepared statement.
//!
//! Without `--kind` the mapper directory is loaded into the cache and the
//! statement is resolved the way a watching application would see it. With
//! `--kind` the mapper file is read from disk and the id must be unique within
//! that kind.
//!
//! ```bash
//! stmtreg get users findUser --param name=ann --param age=30
//! stmtreg get users removeUser --kind delete --param id=7
//! ```

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use crate::core::{ErrorContext, RegistryError, similar_names};
use crate::mapper::StatementKind;
use crate::registry::StatementRegistry;
use crate::templating::{self, ParamValue, Params};

#[derive(Args, Debug)]
pub struct GetCommand {
    /// Mapper name (file name without extension)
    mapper: String,

    /// Statement id
    id: String,

    /// Resolve from disk, requiring exactly one statement of this kind
    #[arg(long, value_enum)]
    kind: Option<StatementKind>,

    /// Parameter binding as key=value; values are read as JSON scalars when possible
    #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    params: Vec<(String, ParamValue)>,
}

impl GetCommand {
    pub async fn execute(self, registry: &StatementRegistry) -> Result<()> {
        let params: Option<Params> = if self.params.is_empty() {
            None
        } else {
            Some(self.params.into_iter().collect())
        };

        let resolved = match self.kind {
            Some(kind) => {
                registry
                    .get_kind_statement(kind, &self.mapper, &self.id, params.as_ref())
                    .await
            }
            None => {
                registry.preload().await?;
                registry.get_statement(&self.mapper, &self.id, params.as_ref())
            }
        };

        let sql = match resolved {
            Ok(sql) => sql,
            Err(e @ RegistryError::StatementNotFound { .. }) => {
                return Err(not_found_context(registry, e, self.kind, &self.mapper, &self.id).await.into());
            }
            Err(e) => return Err(e.into()),
        };

        let unbound = templating::placeholders(&sql);
        if params.is_some() && !unbound.is_empty() {
            eprintln!("{}: unbound placeholder(s): {}", "warning".yellow(), unbound.join(", "));
        }

        println!("{sql}");
        Ok(())
    }
}

/// Attach "did you mean" ids to a not-found error.
async fn not_found_context(
    registry: &StatementRegistry,
    error: RegistryError,
    kind: Option<StatementKind>,
    mapper: &str,
    id: &str,
) -> ErrorContext {
    let candidates: Vec<String> = match kind {
        Some(kind) => match registry.load_document(mapper).await {
            Ok(document) => document.statements(kind).iter().map(|s| s.id.clone()).collect(),
            Err(_) => Vec::new(),
        },
        None => registry
            .cache()
            .get(mapper)
            .map(|index| index.ids().map(str::to_string).collect())
            .unwrap_or_default(),
    };

    let similar = similar_names(id, candidates.iter().map(String::as_str));
    let ctx = crate::core::user_friendly_error(error.into());
    if similar.is_empty() {
        ctx
    } else {
        ctx.with_suggestion(format!("Did you mean: {}?", similar.join(", ")))
    }
}

/// Parse `key=value`, reading the value as a JSON scalar or else as text.
fn parse_param(raw: &str) -> Result<(String, ParamValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    if key.is_empty() {
        bail!("parameter name is empty in '{raw}'");
    }

    let value = serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .and_then(|json| ParamValue::try_from(json).ok())
        .unwrap_or_else(|| ParamValue::from(value));

    Ok((key.to_string(), value))
}
