//! In-memory engine. Default backend for tests and the CLI.

use crate::{
    column_families::all_column_families,
    engine::{EngineStorage, KvEngine, WriteOp},
    errors::{Result, StorageError},
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{PoisonError, RwLock},
};

type ColumnFamily = BTreeMap<Vec<u8>, Vec<u8>>;

/// Ordered maps per column family behind one lock
pub struct MemoryEngine {
    column_families: RwLock<HashMap<String, ColumnFamily>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        let column_families = all_column_families()
            .into_iter()
            .map(|cf| (cf.to_string(), ColumnFamily::new()))
            .collect();
        Self {
            column_families: RwLock::new(column_families),
        }
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cfs = self
            .column_families
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let rows = cfs
            .get(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;
        Ok(rows.get(key).cloned())
    }

    fn scan_prefix(&self, cf: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cfs = self
            .column_families
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let rows = cfs
            .get(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;
        Ok(rows
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn write(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut cfs = self
            .column_families
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Validate before applying anything so a bad batch leaves no trace
        for op in &ops {
            let (WriteOp::Put { cf, .. } | WriteOp::Delete { cf, .. }) = op;
            if !cfs.contains_key(cf) {
                return Err(StorageError::InvalidColumnFamily(cf.clone()));
            }
        }

        for op in ops {
            match op {
                WriteOp::Put { cf, key, value } => {
                    if let Some(rows) = cfs.get_mut(&cf) {
                        rows.insert(key, value);
                    }
                }
                WriteOp::Delete { cf, key } => {
                    if let Some(rows) = cfs.get_mut(&cf) {
                        rows.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Transactional in-memory storage
pub type MemoryStorage = EngineStorage<MemoryEngine>;

impl EngineStorage<MemoryEngine> {
    pub fn new() -> Self {
        Self::with_engine(MemoryEngine::default())
    }
}

impl Default for EngineStorage<MemoryEngine> {
    fn default() -> Self {
        Self::new()
    }
}
