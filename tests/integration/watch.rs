//! Watcher lifecycle against real filesystem events.
//!
//! Event delivery latency depends on the platform backend, so every assertion
//! polls until it holds or a deadline passes.

use serial_test::serial;
use statement_registry::test_utils::{MapperDir, MapperFixture, init_test_logging};
use statement_registry::{RegistryError, StatementRegistry, registry};
use std::time::Duration;
use tokio::time::{Instant, sleep};

const DEADLINE: Duration = Duration::from_secs(10);

/// Poll `condition` until it holds, failing the test after [`DEADLINE`].
async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {what}");
        sleep(Duration::from_millis(50)).await;
    }
}

async fn watching(dir: &MapperDir) -> StatementRegistry {
    init_test_logging(None);
    StatementRegistry::init(dir.config().with_watch(true)).await.unwrap()
}

#[tokio::test]
#[serial]
async fn test_existing_files_are_loaded_on_start() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();
    dir.add(&MapperFixture::empty()).unwrap();
    dir.add(&MapperFixture::malformed()).unwrap();

    let registry = watching(&dir).await;
    assert!(registry.is_watching());
    // Malformed files never get an entry
    assert_eq!(registry.cache().names(), vec!["empty", "users"]);

    registry.shutdown().await;
    assert!(!registry.is_watching());
}

#[tokio::test]
#[serial]
async fn test_add_change_unlink() {
    let dir = MapperDir::new().unwrap();
    let registry = watching(&dir).await;
    assert!(registry.cache().is_empty());

    dir.write("orders", r#"<mapper><select id="all">SELECT * FROM orders</select></mapper>"#)
        .unwrap();
    eventually("add", || registry.get_statement("orders", "all", None).is_ok()).await;

    dir.write("orders", r#"<mapper><select id="open">SELECT * FROM orders WHERE open</select></mapper>"#)
        .unwrap();
    eventually("change", || registry.get_statement("orders", "open", None).is_ok()).await;
    // Replaced, not merged
    assert!(matches!(
        registry.get_statement("orders", "all", None),
        Err(RegistryError::StatementNotFound { .. })
    ));

    dir.remove("orders").unwrap();
    eventually("unlink", || !registry.cache().contains("orders")).await;

    registry.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_broken_edit_keeps_last_good_snapshot() {
    let dir = MapperDir::new().unwrap();
    dir.add(&MapperFixture::users()).unwrap();
    let registry = watching(&dir).await;

    dir.write("users", "<mapper><select id=\"half").unwrap();
    // Give the watcher a chance to see the broken write
    sleep(Duration::from_millis(500)).await;
    assert!(registry.get_statement("users", "findUser", None).is_ok());

    dir.write("users", r#"<mapper><select id="fixed">SELECT 1</select></mapper>"#).unwrap();
    eventually("recovery", || registry.get_statement("users", "fixed", None).is_ok()).await;

    registry.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_hidden_and_foreign_files_are_ignored() {
    let dir = MapperDir::new().unwrap();
    let registry = watching(&dir).await;

    dir.write(".scratch", r#"<mapper><select id="q">SELECT 1</select></mapper>"#).unwrap();
    std::fs::write(dir.root().join("notes.txt"), "not a mapper").unwrap();
    dir.write("visible", r#"<mapper><select id="q">SELECT 1</select></mapper>"#).unwrap();

    eventually("visible mapper", || registry.cache().contains("visible")).await;
    assert_eq!(registry.cache().names(), vec!["visible"]);

    registry.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_shutdown_stops_updates() {
    let dir = MapperDir::new().unwrap();
    let registry = watching(&dir).await;
    registry.shutdown().await;

    dir.add(&MapperFixture::users()).unwrap();
    sleep(Duration::from_millis(500)).await;
    assert!(!registry.cache().contains("users"));
}

#[tokio::test]
#[serial]
async fn test_missing_root_fails_to_watch() {
    let dir = MapperDir::new().unwrap();
    let config = statement_registry::RegistryConfig::new(dir.root().join("absent")).with_watch(true);

    let err = StatementRegistry::init(config).await.unwrap_err();
    assert!(matches!(err, RegistryError::Watch { .. } | RegistryError::Io { .. }));
}

#[tokio::test]
#[serial]
async fn test_global_registry_initializes_once() {
    let first = MapperDir::new().unwrap();
    let second = MapperDir::new().unwrap();
    first.add(&MapperFixture::users()).unwrap();

    let registry = registry::global::init(first.config()).await.unwrap();
    let again = registry::global::init(second.config()).await.unwrap();

    assert!(std::ptr::eq(registry, again));
    assert_eq!(again.config().root, first.root());
    assert!(registry::global::get().is_some());
}

#[tokio::test]
#[serial]
async fn test_preload_leaves_watched_cache_alone() {
    let dir = MapperDir::new().unwrap();
    let path = dir.add(&MapperFixture::users()).unwrap();
    let registry = watching(&dir).await;

    // Drop the entry behind the watcher's back; no filesystem event follows
    registry.cache().unload(&path);
    assert_eq!(registry.preload().await.unwrap(), 0);
    assert!(!registry.cache().contains("users"));

    registry.shutdown().await;
    assert_eq!(registry.preload().await.unwrap(), 1);
    assert!(registry.cache().contains("users"));
}
