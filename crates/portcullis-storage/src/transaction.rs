//! Row-locking transactions over a [`KvEngine`].

use crate::{
    engine::{KvEngine, WriteOp},
    errors::{Result, StorageError},
    traits::Transaction,
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{ready, Context, Poll},
};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

/// (column family, encoded key)
type RowKey = (String, Vec<u8>);

/// Per-row async mutexes shared by every transaction of one store.
///
/// Entries are created on first use and removed once no transaction holds
/// or waits on them.
#[derive(Default)]
pub(crate) struct LockTable {
    rows: Mutex<HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockTable {
    fn acquire<'a>(&'a self, row: &'a RowKey) -> RowWaiter<'a> {
        let mutex = {
            let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(rows.entry(row.clone()).or_default())
        };
        RowWaiter {
            table: self,
            row,
            lock: Some(Box::pin(mutex.lock_owned())),
        }
    }

    fn release(&self, row: &RowKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.prune(row);
    }

    /// Drop the entry for `row` once nothing else references its mutex
    fn prune(&self, row: &RowKey) {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        if rows
            .get(row)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            rows.remove(row);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

type LockFuture = Pin<Box<dyn Future<Output = OwnedMutexGuard<()>> + Send>>;

/// Pending row acquisition. A waiter dropped before it gets the lock
/// prunes the row entry once nothing else uses it.
struct RowWaiter<'a> {
    table: &'a LockTable,
    row: &'a RowKey,
    lock: Option<LockFuture>,
}

impl Future for RowWaiter<'_> {
    type Output = OwnedMutexGuard<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(lock) = self.lock.as_mut() else {
            return Poll::Pending;
        };
        let guard = ready!(lock.as_mut().poll(cx));
        self.lock = None;
        Poll::Ready(guard)
    }
}

impl Drop for RowWaiter<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            self.table.prune(self.row);
        }
    }
}

pub(crate) struct EngineTransaction<E: KvEngine> {
    engine: Arc<E>,
    locks: Arc<LockTable>,
    commit_lock: Arc<tokio::sync::Mutex<()>>,
    held: HashMap<RowKey, OwnedMutexGuard<()>>,
    /// `None` stages a delete
    pending: BTreeMap<RowKey, Option<Vec<u8>>>,
    inserted: HashSet<RowKey>,
}

impl<E: KvEngine> EngineTransaction<E> {
    pub(crate) fn new(
        engine: Arc<E>,
        locks: Arc<LockTable>,
        commit_lock: Arc<tokio::sync::Mutex<()>>,
    ) -> Self {
        Self {
            engine,
            locks,
            commit_lock,
            held: HashMap::new(),
            pending: BTreeMap::new(),
            inserted: HashSet::new(),
        }
    }

    async fn lock_row(&mut self, row: &RowKey) {
        if self.held.contains_key(row) {
            return;
        }
        let guard = self.locks.acquire(row).await;
        self.held.insert(row.clone(), guard);
    }

    fn read(&self, row: &RowKey) -> Result<Option<Vec<u8>>> {
        match self.pending.get(row) {
            Some(staged) => Ok(staged.clone()),
            None => self.engine.get(&row.0, &row.1),
        }
    }
}

#[async_trait]
impl<E: KvEngine> Transaction for EngineTransaction<E> {
    async fn get_raw(&mut self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.read(&(cf.to_string(), key.to_vec()))
    }

    async fn get_for_update_raw(&mut self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let row = (cf.to_string(), key.to_vec());
        self.lock_row(&row).await;
        self.read(&row)
    }

    async fn lock_raw(&mut self, cf: &str, key: &[u8]) -> Result<()> {
        self.lock_row(&(cf.to_string(), key.to_vec())).await;
        Ok(())
    }

    async fn scan_prefix_raw(
        &mut self,
        cf: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.engine.scan_prefix(cf, prefix)?.into_iter().collect();

        for ((staged_cf, key), staged) in &self.pending {
            if staged_cf != cf || !key.starts_with(prefix) {
                continue;
            }
            match staged {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    async fn insert_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let row = (cf.to_string(), key);
        self.lock_row(&row).await;
        if self.read(&row)?.is_some() {
            return Err(StorageError::AlreadyExists);
        }
        self.pending.insert(row.clone(), Some(value));
        self.inserted.insert(row);
        Ok(())
    }

    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.pending.insert((cf.to_string(), key), Some(value));
        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        self.pending.insert((cf.to_string(), key), None);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let inserted = std::mem::take(&mut self.inserted);
        if pending.is_empty() {
            debug!("Transaction committed with no writes");
            return Ok(());
        }

        let _commit = self.commit_lock.lock().await;

        // Unique inserts are re-checked against rows written without a lock
        for row in &inserted {
            if matches!(pending.get(row), Some(Some(_))) && self.engine.get(&row.0, &row.1)?.is_some()
            {
                return Err(StorageError::AlreadyExists);
            }
        }

        let writes = pending.len();
        let ops = pending
            .into_iter()
            .map(|((cf, key), staged)| match staged {
                Some(value) => WriteOp::Put { cf, key, value },
                None => WriteOp::Delete { cf, key },
            })
            .collect();
        self.engine.write(ops)?;

        debug!(writes, locks = self.held.len(), "Transaction committed");
        Ok(())
    }

    fn rollback(mut self: Box<Self>) {
        debug!(discarded = self.pending.len(), "Transaction rolled back");
        self.pending.clear();
    }
}

impl<E: KvEngine> Drop for EngineTransaction<E> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                discarded = self.pending.len(),
                "Transaction dropped without commit"
            );
            self.pending.clear();
        }
        for (row, guard) in self.held.drain() {
            self.locks.release(&row, guard);
        }
    }
}
