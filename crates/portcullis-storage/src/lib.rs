//! # portcullis-storage
//!
//! Transactional key-value storage used by the token services.
//!
//! Every operation runs inside a [`Transaction`]. Rows read with
//! `get_for_update` (or explicitly locked) stay locked until the
//! transaction commits, rolls back, or is dropped, so concurrent redeemers
//! of the same record are serialized by the store rather than by the
//! services.

#![warn(clippy::all)]

pub mod column_families;
mod engine;
pub mod errors;
mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_impl;
pub mod traits;
mod transaction;

#[cfg(test)]
mod tests;

pub use column_families::*;
pub use engine::{EngineStorage, KvEngine, WriteOp};
pub use errors::{Result, StorageError};
pub use memory::{MemoryEngine, MemoryStorage};
#[cfg(feature = "rocksdb")]
pub use rocksdb_impl::{RocksDbEngine, RocksDbStorage};
pub use traits::{Storage, Transaction, TransactionExt};
