/*!
 * Command implementations
 */

pub mod auth;
pub mod providers;
pub mod tokens;

use crate::config::Config;
use anyhow::{Context, Result};
use portcullis_providers::ProviderRegistry;
use std::sync::Arc;

#[cfg(feature = "rocksdb")]
pub type CliStorage = portcullis_storage::RocksDbStorage;

#[cfg(not(feature = "rocksdb"))]
pub type CliStorage = portcullis_storage::MemoryStorage;

/// Open the configured store.
///
/// Without the `rocksdb` feature records only live for this process.
pub fn open_storage(config: &Config) -> Result<Arc<CliStorage>> {
    #[cfg(feature = "rocksdb")]
    let storage = portcullis_storage::RocksDbStorage::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;

    #[cfg(not(feature = "rocksdb"))]
    let storage = {
        tracing::debug!(service = %config.service_name, "Using in-memory storage");
        portcullis_storage::MemoryStorage::new()
    };

    Ok(Arc::new(storage))
}

pub async fn load_registry(config: &Config) -> Result<Arc<ProviderRegistry>> {
    let registry = ProviderRegistry::new();
    registry
        .load_providers(&config.providers)
        .await
        .context("failed to load providers")?;
    Ok(Arc::new(registry))
}
