//! Statement registry: cached and on-demand statement resolution.
//!
//! [`StatementRegistry`] is the entry point for application code. It owns a
//! [`RegistryCache`] and, in watch mode, a [`Watcher`] that keeps the cache in
//! sync with the mapper directory.
//!
//! # Resolution modes
//!
//! - **Cached** ([`StatementRegistry::get_statement`]): reads the flattened
//!   index built from watch events. Kinds are not distinguished and there is no
//!   fallback to disk. A mapper the watcher has not seen is
//!   [`RegistryError::StatementNotFound`].
//! - **On demand** ([`StatementRegistry::get_select_statement`] and friends):
//!   decodes the mapper file from disk on every call, ignoring the cache, and
//!   requires exactly one statement of the requested kind with the requested id.
//!
//! Both modes return SQL text with parameters substituted by
//! [`templating::prepare`]. Nothing is executed. Substitution is textual:
//! **callers are responsible for making parameter values safe**.
//!
//! # Examples
//!
//! ```rust,no_run
//! use statement_registry::config::RegistryConfig;
//! use statement_registry::registry::StatementRegistry;
//! use statement_registry::templating::Params;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = StatementRegistry::init(RegistryConfig::new("mappers").with_watch(true)).await?;
//!
//! let mut params = Params::new();
//! params.insert("id".to_string(), 7.into());
//!
//! let cached = registry.get_statement("users", "findUser", Some(&params))?;
//! let fresh = registry.get_select_statement("users", "findUser", Some(&params)).await?;
//! assert_eq!(cached, fresh);
//!
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod global;
pub mod watch;

pub use cache::{CacheUpdate, RegistryCache, WatchEvent};
pub use watch::{Watcher, scan_mappers};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::core::RegistryError;
use crate::mapper::{self, MapperDocument, StatementKind};
use crate::templating::{self, Params};

/// Lookup request in the shape used by application handlers.
///
/// Serialized with camelCase keys: `{"mapFile": "users", "id": "findUser", "param": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapperRequest {
    /// Mapper base name, e.g. `users` for `users.xml`
    pub map_file: String,
    /// Statement id
    pub id: String,
    /// Optional parameter bindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<Params>,
}

impl MapperRequest {
    pub fn new(map_file: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            map_file: map_file.into(),
            id: id.into(),
            param: None,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.param = Some(params);
        self
    }
}

/// SQL statement registry over one mapper directory.
#[derive(Debug)]
pub struct StatementRegistry {
    config: RegistryConfig,
    cache: Arc<RegistryCache>,
    watcher: Mutex<Option<Watcher>>,
}

impl StatementRegistry {
    /// Registry without a watcher. The cache starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if the config is invalid.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        let cache = Arc::new(RegistryCache::new(config.extension.clone()));

        Ok(Self {
            config,
            cache,
            watcher: Mutex::new(None),
        })
    }

    /// Registry that starts watching when `config.watch` is set.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, or if watching is requested and the
    /// root cannot be scanned or watched.
    pub async fn init(config: RegistryConfig) -> Result<Self, RegistryError> {
        let watch = config.watch;
        let registry = Self::new(config)?;
        if watch {
            registry.start_watching().await?;
        }
        Ok(registry)
    }

    /// Start the watcher if it is not already running.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Watch`] or [`RegistryError::Io`] if the root
    /// cannot be watched or scanned.
    pub async fn start_watching(&self) -> Result<(), RegistryError> {
        if self.is_watching() {
            return Ok(());
        }

        let watcher = Watcher::start(&self.config.root, Arc::clone(&self.cache)).await?;
        let previous = self.watcher_slot().replace(watcher);
        if let Some(previous) = previous {
            // Lost a race with a concurrent start; keep the newer one
            previous.shutdown().await;
        }
        Ok(())
    }

    /// Stop the watcher, if any. The cache keeps its last state.
    pub async fn shutdown(&self) {
        let watcher = self.watcher_slot().take();
        if let Some(watcher) = watcher {
            watcher.shutdown().await;
        }
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.watcher_slot().is_some()
    }

    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &RegistryCache {
        &self.cache
    }

    /// Path of the mapper file named `mapper_file`.
    #[must_use]
    pub fn mapper_path(&self, mapper_file: &str) -> PathBuf {
        self.config.mapper_path(mapper_file)
    }

    /// Resolve `id` from the cached index of `mapper_file`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StatementNotFound`] if the mapper has not been
    /// observed by the watcher or does not declare `id`.
    pub fn get_statement(
        &self,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        let not_found = || RegistryError::StatementNotFound {
            mapper_file: mapper_file.to_string(),
            kind: None,
            id: id.to_string(),
        };

        let index = self.cache.get(mapper_file).ok_or_else(not_found)?;
        let body = index.get(id).ok_or_else(not_found)?;
        debug!("Resolved {}.{} from cache", mapper_file, id);

        templating::prepare(body, params)
    }

    /// [`get_statement`](Self::get_statement) for a [`MapperRequest`].
    ///
    /// # Errors
    ///
    /// See [`get_statement`](Self::get_statement).
    pub fn get_statement_for(&self, request: &MapperRequest) -> Result<String, RegistryError> {
        self.get_statement(&request.map_file, &request.id, request.param.as_ref())
    }

    /// Resolve a `select` statement from disk.
    ///
    /// # Errors
    ///
    /// See [`get_kind_statement`](Self::get_kind_statement).
    pub async fn get_select_statement(
        &self,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        self.get_kind_statement(StatementKind::Select, mapper_file, id, params).await
    }

    /// Resolve an `insert` statement from disk.
    ///
    /// # Errors
    ///
    /// See [`get_kind_statement`](Self::get_kind_statement).
    pub async fn get_insert_statement(
        &self,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        self.get_kind_statement(StatementKind::Insert, mapper_file, id, params).await
    }

    /// Resolve an `update` statement from disk.
    ///
    /// # Errors
    ///
    /// See [`get_kind_statement`](Self::get_kind_statement).
    pub async fn get_update_statement(
        &self,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        self.get_kind_statement(StatementKind::Update, mapper_file, id, params).await
    }

    /// Resolve a `delete` statement from disk.
    ///
    /// # Errors
    ///
    /// See [`get_kind_statement`](Self::get_kind_statement).
    pub async fn get_delete_statement(
        &self,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        self.get_kind_statement(StatementKind::Delete, mapper_file, id, params).await
    }

    /// Decode `mapper_file` from disk and resolve exactly one `kind` statement
    /// with `id`.
    ///
    /// The cache is never consulted, even in watch mode.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Io`] if the mapper file cannot be read
    /// - [`RegistryError::Decode`] if it is malformed
    /// - [`RegistryError::StatementNotFound`] if no statement matches
    /// - [`RegistryError::StatementDuplicate`] if more than one matches
    pub async fn get_kind_statement(
        &self,
        kind: StatementKind,
        mapper_file: &str,
        id: &str,
        params: Option<&Params>,
    ) -> Result<String, RegistryError> {
        let document = self.load_document(mapper_file).await?;

        let matches: Vec<_> = document.matching(kind, id).collect();
        let statement = match matches.as_slice() {
            [single] => *single,
            [] => {
                return Err(RegistryError::StatementNotFound {
                    mapper_file: mapper_file.to_string(),
                    kind: Some(kind),
                    id: id.to_string(),
                });
            }
            many => {
                return Err(RegistryError::StatementDuplicate {
                    mapper_file: mapper_file.to_string(),
                    kind,
                    id: id.to_string(),
                    count: many.len(),
                });
            }
        };
        debug!("Resolved {}.{}.{} from disk", mapper_file, kind, id);

        templating::prepare(&statement.body, params)
    }

    /// [`get_kind_statement`](Self::get_kind_statement) for a [`MapperRequest`].
    ///
    /// # Errors
    ///
    /// See [`get_kind_statement`](Self::get_kind_statement).
    pub async fn get_kind_statement_for(
        &self,
        kind: StatementKind,
        request: &MapperRequest,
    ) -> Result<String, RegistryError> {
        self.get_kind_statement(kind, &request.map_file, &request.id, request.param.as_ref())
            .await
    }

    /// Decode `mapper_file` fresh from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] or [`RegistryError::Decode`].
    pub async fn load_document(&self, mapper_file: &str) -> Result<MapperDocument, RegistryError> {
        mapper::decode_file(&self.mapper_path(mapper_file)).await
    }

    /// Ids declared more than once within a kind in `mapper_file`.
    ///
    /// Returns `(kind, id, count)` triples; an empty list means every
    /// kind-specific lookup in the file is unambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] or [`RegistryError::Decode`].
    pub async fn check(
        &self,
        mapper_file: &str,
    ) -> Result<Vec<(StatementKind, String, usize)>, RegistryError> {
        Ok(self.load_document(mapper_file).await?.duplicates())
    }

    /// Load every mapper file under the root into the cache without watching.
    ///
    /// Returns the number of files that decoded successfully. Files that fail
    /// to decode are logged and skipped, as they are in watch mode.
    ///
    /// While a watcher is running the cache belongs to it: `preload` leaves
    /// the cache untouched and returns the number of cached mappers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the root cannot be walked.
    pub async fn preload(&self) -> Result<usize, RegistryError> {
        if self.is_watching() {
            debug!("Skipping preload, watcher owns the cache");
            return Ok(self.cache.len());
        }

        let paths = scan_mappers(&self.config.root, &self.config.extension).await?;

        let mut loaded = 0;
        for path in &paths {
            if matches!(
                self.cache.load(path).await,
                CacheUpdate::Inserted(_) | CacheUpdate::Replaced(_)
            ) {
                loaded += 1;
            }
        }
        debug!("Preloaded {} of {} mapper file(s)", loaded, paths.len());
        Ok(loaded)
    }

    /// Names of the mapper files currently on disk under the root.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the root cannot be walked.
    pub async fn mapper_names(&self) -> Result<Vec<String>, RegistryError> {
        let paths = scan_mappers(&self.config.root, &self.config.extension).await?;
        let mut names: Vec<String> = paths.iter().filter_map(|path| mapper::mapper_name(path)).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn watcher_slot(&self) -> std::sync::MutexGuard<'_, Option<Watcher>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
