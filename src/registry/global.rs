//! Process-wide registry for applications that want a single shared instance.
//!
//! The first successful [`init`] wins. Later calls return the existing registry
//! and ignore their config, so startup code can call `init` from several places
//! without coordination.

use tokio::sync::OnceCell;

use super::StatementRegistry;
use crate::config::RegistryConfig;
use crate::core::RegistryError;

static REGISTRY: OnceCell<StatementRegistry> = OnceCell::const_new();

/// Initialize the shared registry, or return it if already initialized.
///
/// # Errors
///
/// Propagates [`StatementRegistry::init`] failures. A failed attempt leaves
/// the cell empty so a later call can retry.
pub async fn init(config: RegistryConfig) -> Result<&'static StatementRegistry, RegistryError> {
    REGISTRY.get_or_try_init(|| StatementRegistry::init(config)).await
}

/// The shared registry, if [`init`] has completed.
#[must_use]
pub fn get() -> Option<&'static StatementRegistry> {
    REGISTRY.get()
}
