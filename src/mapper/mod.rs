//! Mapper file model, decoding, and flattening.
//!
//! A mapper file is an XML document with one root element whose direct children
//! declare SQL statement templates:
//!
//! ```xml
//! <mapper>
//!   <select id="findUser">SELECT * FROM users WHERE id = #{id}</select>
//!   <delete id="purgeUser">DELETE FROM users WHERE id = #{id}</delete>
//! </mapper>
//! ```
//!
//! - [`decoder`] turns raw markup into a [`MapperDocument`], statements grouped by kind
//! - [`index`] flattens a document into a [`StatementIndex`] keyed by id alone
//!
//! The mapper name used in lookups is the file stem: `mappers/users.xml` is `users`.

pub mod decoder;
pub mod index;

pub use decoder::{decode, decode_file};
pub use index::StatementIndex;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::core::RegistryError;

/// Coarse classification of a statement, taken from its element name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    /// All kinds in the order they are merged into a [`StatementIndex`].
    pub const ALL: [StatementKind; 4] = [
        StatementKind::Select,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
    ];

    /// Element name used for this kind in mapper files.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
        }
    }

    /// Look up a kind by its element name.
    #[must_use]
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag().as_bytes() == tag)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

impl FromStr for StatementKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s.to_ascii_lowercase().as_bytes()).ok_or_else(|| RegistryError::Other {
            message: format!("Unknown statement kind '{s}' (expected select, insert, update or delete)"),
        })
    }
}

/// One named SQL template declared in a mapper file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub id: String,
    pub kind: StatementKind,
    /// Raw template text, possibly containing `#{name}` placeholders.
    pub body: String,
}

/// Decoded mapper file with statements grouped by kind.
///
/// Each kind keeps its statements in document order. Ids are not checked for
/// uniqueness here; duplicate detection happens at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapperDocument {
    by_kind: [Vec<Statement>; 4],
}

impl MapperDocument {
    /// Statements of one kind, in document order.
    #[must_use]
    pub fn statements(&self, kind: StatementKind) -> &[Statement] {
        &self.by_kind[kind.slot()]
    }

    /// Every statement, kinds in [`StatementKind::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.by_kind.iter().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_kind.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statements of `kind` whose id equals `id`.
    pub fn matching<'a>(
        &'a self,
        kind: StatementKind,
        id: &'a str,
    ) -> impl Iterator<Item = &'a Statement> + 'a {
        self.statements(kind).iter().filter(move |statement| statement.id == id)
    }

    /// `(kind, id, count)` for every id declared more than once within a kind.
    #[must_use]
    pub fn duplicates(&self) -> Vec<(StatementKind, String, usize)> {
        let mut found = Vec::new();
        for kind in StatementKind::ALL {
            let mut counts: indexmap::IndexMap<&str, usize> = indexmap::IndexMap::new();
            for statement in self.statements(kind) {
                *counts.entry(statement.id.as_str()).or_default() += 1;
            }
            found.extend(
                counts
                    .into_iter()
                    .filter(|(_, count)| *count > 1)
                    .map(|(id, count)| (kind, id.to_string(), count)),
            );
        }
        found
    }

    pub(crate) fn push(&mut self, statement: Statement) {
        self.by_kind[statement.kind.slot()].push(statement);
    }
}

/// Mapper name for a path: the file stem, extension stripped.
#[must_use]
pub fn mapper_name(path: &Path) -> Option<String> {
    path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
}

/// Whether `path` carries the mapper extension (compared without the dot).
#[must_use]
pub fn has_mapper_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(extension)
}
