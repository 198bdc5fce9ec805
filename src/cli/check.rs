//! Validate mapper files.
//!
//! A mapper passes when it decodes and no id is declared twice within a kind.
//! Duplicates are legal markup but make kind-specific lookups fail, so they are
//! reported as failures here.
//!
//! ```bash
//! stmtreg check          # every mapper file under the root
//! stmtreg check users    # just users.xml
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::core::{ErrorContext, RegistryError};
use crate::mapper::{self, StatementKind};
use crate::registry::{StatementRegistry, scan_mappers};

#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Mapper name; checks every mapper file when omitted
    mapper: Option<String>,
}

/// Result of checking one file.
#[derive(Debug)]
enum Outcome {
    Valid(usize),
    Duplicates(Vec<(StatementKind, String, usize)>),
    Invalid(RegistryError),
}

impl CheckCommand {
    pub async fn execute(self, registry: &StatementRegistry) -> Result<()> {
        let config = registry.config();
        let paths: Vec<PathBuf> = match &self.mapper {
            Some(name) => vec![registry.mapper_path(name)],
            None => scan_mappers(&config.root, &config.extension).await?,
        };

        let mut failed = 0;
        for path in &paths {
            let outcome = check_file(path).await;
            if !matches!(outcome, Outcome::Valid(_)) {
                failed += 1;
            }
            report(&config.root, path, &outcome);
        }

        if failed > 0 {
            return Err(ErrorContext::new(RegistryError::Other {
                message: format!("{failed} of {} mapper file(s) failed validation", paths.len()),
            })
            .into());
        }

        println!("{} {} mapper file(s) valid", "✓".green(), paths.len());
        Ok(())
    }
}

async fn check_file(path: &Path) -> Outcome {
    match mapper::decode_file(path).await {
        Ok(document) => {
            let duplicates = document.duplicates();
            if duplicates.is_empty() {
                Outcome::Valid(document.len())
            } else {
                Outcome::Duplicates(duplicates)
            }
        }
        Err(e) => Outcome::Invalid(e),
    }
}

fn report(root: &Path, path: &Path, outcome: &Outcome) {
    let shown = path.strip_prefix(root).unwrap_or(path).display();
    match outcome {
        Outcome::Valid(count) => println!("{} {} ({} statement(s))", "✓".green(), shown, count),
        Outcome::Duplicates(duplicates) => {
            println!("{} {}", "✗".red(), shown);
            for (kind, id, count) in duplicates {
                println!("    duplicate {kind} id '{id}' ({count} definitions)");
            }
        }
        Outcome::Invalid(e) => println!("{} {}: {}", "✗".red(), shown, e),
    }
}
