//! RocksDB engine (`rocksdb` feature).

use crate::{
    column_families::all_column_families,
    engine::{EngineStorage, KvEngine, WriteOp},
    errors::{Result, StorageError},
};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use tracing::debug;

/// RocksDB engine
pub struct RocksDbEngine {
    db: DB,
}

impl RocksDbEngine {
    /// Open RocksDB database at the specified path
    ///
    /// Creates all required column families if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, &path, all_column_families())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!("Opened RocksDB at {:?}", path.as_ref());

        Ok(Self { db })
    }

    fn cf_handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
    }
}

impl KvEngine for RocksDbEngine {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf_handle = self.cf_handle(cf)?;
        self.db
            .get_cf(cf_handle, key)
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn scan_prefix(&self, cf: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf_handle = self.cf_handle(cf)?;
        let mut results = Vec::new();

        // Seek to the prefix; works without a prefix extractor configured
        let iter = self.db.iterator_cf(
            cf_handle,
            rocksdb::IteratorMode::From(prefix, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    fn write(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut batch = WriteBatch::default();
        for op in &ops {
            match op {
                WriteOp::Put { cf, key, value } => batch.put_cf(self.cf_handle(cf)?, key, value),
                WriteOp::Delete { cf, key } => batch.delete_cf(self.cf_handle(cf)?, key),
            }
        }

        self.db
            .write(batch)
            .map_err(|e| StorageError::Database(e.to_string()))
    }
}

/// Transactional RocksDB storage
pub type RocksDbStorage = EngineStorage<RocksDbEngine>;

impl EngineStorage<RocksDbEngine> {
    /// Open a RocksDB-backed store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_engine(RocksDbEngine::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{column_families::*, traits::TransactionExt, Storage};

    #[tokio::test]
    async fn test_commit_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        {
            let storage = RocksDbStorage::open(temp_dir.path()).unwrap();
            let mut tx = storage.begin_transaction().await.unwrap();
            tx.insert(CF_AUTH_TOKENS, "state-1", &42u64).await.unwrap();
            tx.commit().await.unwrap();
        }

        let storage = RocksDbStorage::open(temp_dir.path()).unwrap();
        let mut tx = storage.begin_transaction().await.unwrap();
        let value: Option<u64> = tx.get(CF_AUTH_TOKENS, "state-1").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn test_scan_prefix_stops_at_boundary() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = RocksDbStorage::open(temp_dir.path()).unwrap();
        let user_a = uuid::Uuid::new_v4();
        let user_b = uuid::Uuid::new_v4();

        let mut tx = storage.begin_transaction().await.unwrap();
        tx.put(CF_REFRESH_TOKENS_BY_USER, &(user_a, "h1"), &()).unwrap();
        tx.put(CF_REFRESH_TOKENS_BY_USER, &(user_a, "h2"), &()).unwrap();
        tx.put(CF_REFRESH_TOKENS_BY_USER, &(user_b, "h3"), &()).unwrap();
        tx.commit().await.unwrap();

        let mut tx = storage.begin_transaction().await.unwrap();
        let rows: Vec<(Vec<u8>, ())> = tx
            .scan_prefix(CF_REFRESH_TOKENS_BY_USER, &user_a)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
