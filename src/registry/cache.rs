//! Registry cache of flattened mapper indexes.
//!
//! The cache maps a mapper name (file stem) to an immutable
//! [`StatementIndex`] snapshot. Every update replaces or removes a whole
//! snapshot with a single `DashMap` operation, so a reader sees either the old
//! index or the new one, never a mix. Readers clone the `Arc` and drop the map
//! guard immediately; no guard is held across an `.await`.
//!
//! Updates are driven by [`WatchEvent`]s:
//! - `Add` / `Change`: decode the file and set or replace its entry
//! - `Remove`: drop the entry
//!
//! Paths without the mapper extension are ignored. A file that fails to decode
//! keeps its previous entry; the failure is logged and reported as
//! [`CacheUpdate::Failed`], never returned as an error.
//!
//! Mapper names are file stems, so `a/users.xml` and `b/users.xml` share the
//! `users` entry and the most recent event wins.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::mapper::{self, StatementIndex};

/// Filesystem change relevant to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Add(PathBuf),
    Change(PathBuf),
    Remove(PathBuf),
}

impl WatchEvent {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Add(path) | WatchEvent::Change(path) | WatchEvent::Remove(path) => path,
        }
    }
}

/// Outcome of applying one [`WatchEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheUpdate {
    /// A new mapper entry was created
    Inserted(String),
    /// An existing entry was replaced in full
    Replaced(String),
    /// An entry was dropped
    Removed(String),
    /// The event did not concern a cached mapper file
    Ignored,
    /// Decoding failed; the previous entry, if any, is untouched
    Failed(String),
}

/// Mapper name → flattened statement index.
#[derive(Debug)]
pub struct RegistryCache {
    entries: DashMap<String, Arc<StatementIndex>>,
    extension: String,
}

impl RegistryCache {
    /// Empty cache accepting files with `extension` (no leading dot).
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            entries: DashMap::new(),
            extension: extension.into(),
        }
    }

    /// Apply a filesystem event.
    pub async fn apply(&self, event: &WatchEvent) -> CacheUpdate {
        match event {
            WatchEvent::Add(path) | WatchEvent::Change(path) => self.load(path).await,
            WatchEvent::Remove(path) => self.unload(path),
        }
    }

    /// Decode `path` and set or replace its entry.
    pub async fn load(&self, path: &Path) -> CacheUpdate {
        let Some(name) = self.mapper_name(path) else {
            return CacheUpdate::Ignored;
        };

        let index = match mapper::decode_file(path).await {
            Ok(document) => Arc::new(StatementIndex::from_document(&document)),
            Err(e) => {
                warn!("Keeping previous statements for mapper '{}': {:#}", name, anyhow::Error::from(e));
                return CacheUpdate::Failed(name);
            }
        };

        debug!("Loaded mapper '{}' ({} statement(s))", name, index.len());
        match self.entries.insert(name.clone(), index) {
            Some(_) => CacheUpdate::Replaced(name),
            None => CacheUpdate::Inserted(name),
        }
    }

    /// Drop the entry for `path`.
    pub fn unload(&self, path: &Path) -> CacheUpdate {
        let Some(name) = self.mapper_name(path) else {
            return CacheUpdate::Ignored;
        };

        match self.entries.remove(&name) {
            Some(_) => {
                debug!("Removed mapper '{}'", name);
                CacheUpdate::Removed(name)
            }
            None => CacheUpdate::Ignored,
        }
    }

    /// Snapshot of one mapper's index.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<StatementIndex>> {
        self.entries.get(name).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Cached mapper names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn mapper_name(&self, path: &Path) -> Option<String> {
        if !mapper::has_mapper_extension(path, &self.extension) {
            trace!("Ignoring non-mapper path {}", path.display());
            return None;
        }
        mapper::mapper_name(path)
    }
}
