//! List mapper files, or the statements declared in one mapper.
//!
//! ```bash
//! stmtreg list                  # mapper names under the root
//! stmtreg list users            # kind and id of every statement in users.xml
//! stmtreg list users --format json
//! ```
//!
//! Both forms read from disk. The statement listing keeps duplicates so they
//! show up before `check` is run.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::mapper::{MapperDocument, StatementKind};
use crate::registry::StatementRegistry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One entry per line
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Mapper name; lists mapper files when omitted
    mapper: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct StatementRow<'a> {
    kind: StatementKind,
    id: &'a str,
    body: &'a str,
}

impl ListCommand {
    pub async fn execute(self, registry: &StatementRegistry) -> Result<()> {
        match &self.mapper {
            None => {
                let names = registry.mapper_names().await?;
                match self.format {
                    OutputFormat::Text => names.iter().for_each(|name| println!("{name}")),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                }
            }
            Some(mapper) => {
                let document = registry.load_document(mapper).await?;
                print!("{}", render_statements(&document, self.format)?);
            }
        }
        Ok(())
    }
}

fn render_statements(document: &MapperDocument, format: OutputFormat) -> Result<String> {
    let rows: Vec<StatementRow<'_>> = document
        .iter()
        .map(|statement| StatementRow {
            kind: statement.kind,
            id: &statement.id,
            body: &statement.body,
        })
        .collect();

    Ok(match format {
        OutputFormat::Text => rows.iter().map(|row| format!("{:<6} {}\n", row.kind, row.id)).collect(),
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&rows)?),
    })
}
