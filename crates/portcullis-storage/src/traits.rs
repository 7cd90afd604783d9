//! Storage trait definitions.

use crate::errors::{Result, StorageError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Storage interface
///
/// The only entry point is a transaction. Backends are swappable so the
/// token services can be tested against the in-memory engine.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;
}

/// Transaction over one or more column families.
///
/// Reads observe the transaction's own pending writes. Row locks taken by
/// [`Transaction::get_for_update_raw`] or [`Transaction::lock_raw`] are held
/// until the transaction ends. Dropping a transaction without committing
/// discards its writes.
///
/// Transactions only need to be `Send` since they live inside a single task.
#[async_trait]
pub trait Transaction: Send {
    /// Read a pre-serialized key without locking it
    async fn get_raw(&mut self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Lock the row, then read it
    async fn get_for_update_raw(&mut self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Lock a row without reading it. The row does not need to exist.
    async fn lock_raw(&mut self, cf: &str, key: &[u8]) -> Result<()>;

    /// All pairs whose key starts with `prefix`, in key order
    async fn scan_prefix_raw(&mut self, cf: &str, prefix: &[u8])
        -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Create a row that must not exist yet.
    ///
    /// Fails with [`StorageError::AlreadyExists`] now or at commit time if
    /// another transaction wins the race.
    async fn insert_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Stage an upsert
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()>;

    /// Stage a delete
    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()>;

    /// Apply all staged writes atomically and release locks
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard staged writes and release locks
    fn rollback(self: Box<Self>);
}

/// Type-safe helpers over [`Transaction`].
///
/// Keys and values are bincode-encoded before reaching the raw methods.
#[async_trait]
pub trait TransactionExt: Transaction {
    /// Typed read
    async fn get<K, V>(&mut self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync + ?Sized,
        V: DeserializeOwned + Send,
    {
        let key_bytes = serialize_key(key)?;
        match self.get_raw(cf, &key_bytes).await? {
            Some(bytes) => Ok(Some(deserialize_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Typed locking read
    async fn get_for_update<K, V>(&mut self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync + ?Sized,
        V: DeserializeOwned + Send,
    {
        let key_bytes = serialize_key(key)?;
        match self.get_for_update_raw(cf, &key_bytes).await? {
            Some(bytes) => Ok(Some(deserialize_value(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Typed row lock
    async fn lock<K>(&mut self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync + ?Sized,
    {
        let key_bytes = serialize_key(key)?;
        self.lock_raw(cf, &key_bytes).await
    }

    /// Typed prefix scan. Keys are returned still encoded.
    async fn scan_prefix<K, V>(&mut self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync + ?Sized,
        V: DeserializeOwned + Send,
    {
        let prefix_bytes = serialize_key(prefix)?;
        self.scan_prefix_raw(cf, &prefix_bytes)
            .await?
            .into_iter()
            .map(|(key, value)| Ok((key, deserialize_value(&value)?)))
            .collect()
    }

    /// Typed unique insert
    async fn insert<K, V>(&mut self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync + ?Sized,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;
        self.insert_raw(cf, key_bytes, value_bytes).await
    }

    /// Typed upsert
    fn put<K, V>(&mut self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: Serialize,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;
        self.put_raw(cf, key_bytes, value_bytes)
    }

    /// Typed delete
    fn delete<K>(&mut self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        let key_bytes = serialize_key(key)?;
        self.delete_raw(cf, key_bytes)
    }
}

impl<T: Transaction + ?Sized> TransactionExt for T {}

/// Helper function to serialize a key
pub fn serialize_key<K: Serialize + ?Sized>(key: &K) -> Result<Vec<u8>> {
    bincode::serialize(key).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Helper function to serialize a value
pub(crate) fn serialize_value<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Helper function to deserialize a value
pub fn deserialize_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Deserialization(e.to_string()))
}
