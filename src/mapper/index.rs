//! Flattened `id → body` index for one mapper file.

use indexmap::IndexMap;
use tracing::debug;

use super::{MapperDocument, StatementKind};

/// Statement bodies of one mapper file keyed by id, all kinds merged.
///
/// Kinds are merged in [`StatementKind::ALL`] order and later entries
/// overwrite earlier ones. When `select` and `delete` both declare `purge`,
/// the index holds the `delete` body. The kind-aware resolution path on
/// [`crate::registry::StatementRegistry`] does not have this ambiguity.
///
/// An index is immutable once built. The registry cache shares it behind an
/// `Arc` and swaps whole indexes on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementIndex {
    bodies: IndexMap<String, String>,
}

impl StatementIndex {
    /// Flatten a decoded mapper document.
    #[must_use]
    pub fn from_document(document: &MapperDocument) -> Self {
        let mut bodies = IndexMap::with_capacity(document.len());

        for kind in StatementKind::ALL {
            for statement in document.statements(kind) {
                if bodies.insert(statement.id.clone(), statement.body.clone()).is_some() {
                    debug!("Statement '{}' redefined by <{}>, keeping the later body", statement.id, kind);
                }
            }
        }

        Self { bodies }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.bodies.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.bodies.contains_key(id)
    }

    /// Statement ids in first-declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.bodies.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bodies.iter().map(|(id, body)| (id.as_str(), body.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl From<&MapperDocument> for StatementIndex {
    fn from(document: &MapperDocument) -> Self {
        Self::from_document(document)
    }
}
