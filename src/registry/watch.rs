//! Filesystem watcher that keeps a [`RegistryCache`] in sync with disk.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (own thread)
//!         │  WatchEvent over an unbounded channel
//!         ▼
//! tokio task ──► RegistryCache::apply
//! ```
//!
//! The notify callback only translates and forwards events. All decoding
//! happens on the tokio task, one event at a time, in arrival order.
//!
//! On start, the watcher walks the root and loads every existing mapper file
//! before returning, so the cache reflects pre-existing files once
//! [`Watcher::start`] completes. Paths with a hidden component (a file or
//! directory name starting with `.`) are never loaded.

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::cache::{CacheUpdate, RegistryCache, WatchEvent};
use crate::core::RegistryError;
use crate::mapper;

/// Running watcher over one root directory.
///
/// Call [`shutdown`](Self::shutdown) to stop it and wait for the update task
/// to finish. Dropping a `Watcher` stops event delivery and aborts the task.
pub struct Watcher {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Watcher {
    /// Load existing mapper files under `root`, then follow changes.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Watch`] if the platform watcher cannot be
    /// created or cannot watch `root` (for example when it does not exist).
    pub async fn start(root: &Path, cache: Arc<RegistryCache>) -> Result<Self, RegistryError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<WatchEvent>();

        let event_root = root.to_path_buf();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for change in translate(&event_root, event) {
                    // The receiver is gone only after shutdown
                    let _ = tx.send(change);
                }
            }
            Err(e) => warn!("File watcher error: {}", e),
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        // Watch first, scan second: a file written in between is loaded twice
        // rather than missed.
        let existing = scan_mappers(root, cache.extension()).await?;
        for path in existing {
            log_update(&cache.load(&path).await);
        }
        info!("Watching {} ({} mapper file(s) loaded)", root.display(), cache.len());

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = rx.recv() => match event {
                        Some(event) => log_update(&cache.apply(&event).await),
                        None => break,
                    },
                }
            }
        });

        Ok(Self {
            root: root.to_path_buf(),
            watcher: Some(watcher),
            stop: Some(stop_tx),
            task: Some(task),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching and wait for the update task to exit.
    pub async fn shutdown(mut self) {
        drop(self.watcher.take());
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Watcher task ended abnormally: {}", e);
            }
        }
        info!("Stopped watching {}", self.root.display());
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.root)
            .field("running", &self.task.is_some())
            .finish()
    }
}

fn log_update(update: &CacheUpdate) {
    match update {
        CacheUpdate::Inserted(name) => info!("Mapper '{}' added", name),
        CacheUpdate::Replaced(name) => info!("Mapper '{}' reloaded", name),
        CacheUpdate::Removed(name) => info!("Mapper '{}' removed", name),
        CacheUpdate::Failed(name) => warn!("Mapper '{}' could not be reloaded", name),
        CacheUpdate::Ignored => {}
    }
}

/// Map a notify event onto cache events, dropping hidden paths.
fn translate(root: &Path, event: notify::Event) -> Vec<WatchEvent> {
    let kind = event.kind;
    let mut paths = event.paths.into_iter().filter(|path| !is_hidden(root, path));

    match kind {
        EventKind::Create(_) => paths.map(WatchEvent::Add).collect(),
        EventKind::Remove(_) => paths.map(WatchEvent::Remove).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths.map(WatchEvent::Remove).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths.map(WatchEvent::Add).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::with_capacity(2);
            changes.extend(paths.next().map(WatchEvent::Remove));
            changes.extend(paths.next().map(WatchEvent::Add));
            changes
        }
        // Platforms that cannot tell which side of a rename a path is on
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .map(|path| {
                if path.exists() {
                    WatchEvent::Add(path)
                } else {
                    WatchEvent::Remove(path)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => paths.map(WatchEvent::Change).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Whether any component of `path` below `root` starts with a dot.
pub(crate) fn is_hidden(root: &Path, path: &Path) -> bool {
    let hidden = |name: &std::ffi::OsStr| name.to_str().is_some_and(|name| name.starts_with('.'));

    match path.strip_prefix(root) {
        Ok(relative) => relative.components().any(|component| hidden(component.as_os_str())),
        Err(_) => path.file_name().is_some_and(hidden),
    }
}

/// Every mapper file under `root`, skipping hidden files and directories.
///
/// # Errors
///
/// Returns [`RegistryError::Io`] if `root` cannot be walked.
pub async fn scan_mappers(root: &Path, extension: &str) -> Result<Vec<PathBuf>, RegistryError> {
    let root = root.to_path_buf();
    let extension = extension.to_string();

    let scanned = tokio::task::spawn_blocking(move || {
        let mut found = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(&root, entry.path()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Unreadable entries below the root are skipped
                Err(e) if e.depth() > 0 => {
                    warn!("Skipping {}: {}", e.path().unwrap_or(&root).display(), e);
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(&root).to_path_buf();
                    return Err(RegistryError::Io {
                        path,
                        source: e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected")),
                    });
                }
            };
            if entry.file_type().is_file() && mapper::has_mapper_extension(entry.path(), &extension) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        Ok(found)
    })
    .await
    .map_err(|e| RegistryError::Other {
        message: format!("Mapper scan task failed: {e}"),
    })?;

    if let Ok(found) = &scanned {
        debug!("Found {} mapper file(s)", found.len());
    }
    scanned
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        let mut event = notify::Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_translate_basic_kinds() {
        let root = Path::new("/m");
        assert_eq!(
            translate(root, event(EventKind::Create(CreateKind::File), &["/m/a.xml"])),
            vec![WatchEvent::Add(PathBuf::from("/m/a.xml"))]
        );
        assert_eq!(
            translate(root, event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), &["/m/a.xml"])),
            vec![WatchEvent::Change(PathBuf::from("/m/a.xml"))]
        );
        assert_eq!(
            translate(root, event(EventKind::Remove(RemoveKind::File), &["/m/a.xml"])),
            vec![WatchEvent::Remove(PathBuf::from("/m/a.xml"))]
        );
        assert!(
            translate(root, event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), &["/m/a.xml"]))
                .is_empty()
        );
    }

    #[test]
    fn test_translate_rename_both() {
        let changes = translate(
            Path::new("/m"),
            event(EventKind::Modify(ModifyKind::Name(RenameMode::Both)), &["/m/old.xml", "/m/new.xml"]),
        );
        assert_eq!(
            changes,
            vec![
                WatchEvent::Remove(PathBuf::from("/m/old.xml")),
                WatchEvent::Add(PathBuf::from("/m/new.xml")),
            ]
        );
    }

    #[test]
    fn test_translate_drops_hidden_paths() {
        let changes = translate(
            Path::new("/m"),
            event(EventKind::Create(CreateKind::File), &["/m/.users.xml", "/m/.git/x.xml", "/m/ok.xml"]),
        );
        assert_eq!(changes, vec![WatchEvent::Add(PathBuf::from("/m/ok.xml"))]);
    }

    #[test]
    fn test_is_hidden() {
        let root = Path::new("/srv/.config/mappers");
        // Hidden ancestors above the root do not count
        assert!(!is_hidden(root, Path::new("/srv/.config/mappers/users.xml")));
        assert!(is_hidden(root, Path::new("/srv/.config/mappers/.users.xml.swp")));
        assert!(is_hidden(root, Path::new("/srv/.config/mappers/.cache/users.xml")));
        assert!(is_hidden(root, Path::new("/elsewhere/.users.xml")));
    }

    #[tokio::test]
    async fn test_scan_mappers_skips_hidden_and_other_extensions() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::create_dir_all(root.join(".hidden")).unwrap();
        for file in ["users.xml", "nested/orders.xml", ".hidden/secret.xml", ".dot.xml", "readme.md"] {
            std::fs::write(root.join(file), "<mapper/>").unwrap();
        }

        let found = scan_mappers(root, "xml").await.unwrap();
        let mut names: Vec<_> = found.iter().filter_map(|p| mapper::mapper_name(p)).collect();
        names.sort();
        assert_eq!(names, vec!["orders", "users"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_skips_unreadable_entries_below_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::write(root.join("users.xml"), "<mapper/>").unwrap();
        // Dangling link: following it fails inside the walk
        std::os::unix::fs::symlink(root.join("missing-dir"), root.join("broken")).unwrap();

        let found = scan_mappers(root, "xml").await.unwrap();
        assert_eq!(found, vec![root.join("users.xml")]);
    }

    #[tokio::test]
    async fn test_scan_missing_root_fails() {
        let temp = tempfile::tempdir().unwrap();
        let err = scan_mappers(&temp.path().join("absent"), "xml").await.unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
    }
}
