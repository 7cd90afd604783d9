//! Backend seam shared by the in-memory and RocksDB stores.

use crate::{
    errors::Result,
    traits::{Storage, Transaction},
    transaction::{EngineTransaction, LockTable},
};
use async_trait::async_trait;
use std::sync::Arc;

/// A staged write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        cf: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: String,
        key: Vec<u8>,
    },
}

/// Committed key-value state.
///
/// Engines know nothing about locks or transactions; they only need to
/// apply a batch of writes atomically.
pub trait KvEngine: Send + Sync + 'static {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn scan_prefix(&self, cf: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply all operations or none
    fn write(&self, ops: Vec<WriteOp>) -> Result<()>;
}

/// Transactional storage over any [`KvEngine`]
pub struct EngineStorage<E> {
    engine: Arc<E>,
    locks: Arc<LockTable>,
    commit_lock: Arc<tokio::sync::Mutex<()>>,
}

impl<E: KvEngine> EngineStorage<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            locks: Arc::new(LockTable::default()),
            commit_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Direct access to committed state, bypassing transactions
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub(crate) fn lock_table_len(&self) -> usize {
        self.locks.len()
    }
}

#[async_trait]
impl<E: KvEngine> Storage for EngineStorage<E> {
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(EngineTransaction::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.locks),
            Arc::clone(&self.commit_lock),
        )))
    }
}
