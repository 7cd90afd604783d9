use crate::*;
use std::{sync::Arc, time::Duration};

#[tokio::test]
async fn test_insert_and_get() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.insert(CF_AUTH_TOKENS, "abc", &"google".to_string())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    let value: Option<String> = tx.get(CF_AUTH_TOKENS, "abc").await.unwrap();
    assert_eq!(value.as_deref(), Some("google"));
}

#[tokio::test]
async fn test_insert_duplicate_fails() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.insert(CF_AUTH_TOKENS, "abc", &1u32).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    let result = tx.insert(CF_AUTH_TOKENS, "abc", &2u32).await;
    assert!(matches!(result, Err(StorageError::AlreadyExists)));
}

#[tokio::test]
async fn test_reads_see_own_writes() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.put(CF_AUTH_TOKENS, "abc", &1u32).unwrap();
    let value: Option<u32> = tx.get(CF_AUTH_TOKENS, "abc").await.unwrap();
    assert_eq!(value, Some(1));

    tx.delete(CF_AUTH_TOKENS, "abc").unwrap();
    let value: Option<u32> = tx.get(CF_AUTH_TOKENS, "abc").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_rollback_discards_writes() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.put(CF_AUTH_TOKENS, "abc", &1u32).unwrap();
    tx.rollback();

    let mut tx = storage.begin_transaction().await.unwrap();
    let value: Option<u32> = tx.get(CF_AUTH_TOKENS, "abc").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_drop_discards_writes_and_releases_locks() {
    let storage = MemoryStorage::new();

    {
        let mut tx = storage.begin_transaction().await.unwrap();
        tx.insert(CF_AUTH_TOKENS, "abc", &1u32).await.unwrap();
    }

    let mut tx = storage.begin_transaction().await.unwrap();
    let value: Option<u32> = tokio::time::timeout(
        Duration::from_secs(1),
        tx.get_for_update(CF_AUTH_TOKENS, "abc"),
    )
    .await
    .expect("lock should have been released")
    .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_unknown_column_family() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    let result: Result<Option<u32>> = tx.get("nope", "abc").await;
    assert!(matches!(result, Err(StorageError::InvalidColumnFamily(_))));

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.put("nope", "abc", &1u32).unwrap();
    assert!(matches!(
        tx.commit().await,
        Err(StorageError::InvalidColumnFamily(_))
    ));
}

#[tokio::test]
async fn test_get_for_update_serializes_writers() {
    let storage = Arc::new(MemoryStorage::new());

    let mut seed = storage.begin_transaction().await.unwrap();
    seed.put(CF_AUTH_TOKENS, "counter", &0u32).unwrap();
    seed.commit().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            let mut tx = storage.begin_transaction().await.unwrap();
            let current: u32 = tx
                .get_for_update(CF_AUTH_TOKENS, "counter")
                .await
                .unwrap()
                .unwrap();
            tokio::task::yield_now().await;
            tx.put(CF_AUTH_TOKENS, "counter", &(current + 1)).unwrap();
            tx.commit().await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut tx = storage.begin_transaction().await.unwrap();
    let value: Option<u32> = tx.get(CF_AUTH_TOKENS, "counter").await.unwrap();
    assert_eq!(value, Some(8));
}

#[tokio::test]
async fn test_locked_row_blocks_second_transaction() {
    let storage = MemoryStorage::new();

    let mut first = storage.begin_transaction().await.unwrap();
    first.lock(CF_AUTH_TOKENS, "abc").await.unwrap();

    let mut second = storage.begin_transaction().await.unwrap();
    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        second.lock(CF_AUTH_TOKENS, "abc"),
    )
    .await;
    assert!(blocked.is_err());

    first.commit().await.unwrap();
    second.lock(CF_AUTH_TOKENS, "abc").await.unwrap();
}

#[tokio::test]
async fn test_lock_table_is_cleaned_up() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.lock(CF_AUTH_TOKENS, "a").await.unwrap();
    tx.lock(CF_AUTH_TOKENS, "b").await.unwrap();
    tx.lock(CF_AUTH_TOKENS, "a").await.unwrap();
    tx.put(CF_AUTH_TOKENS, "a", &1u32).unwrap();
    tx.commit().await.unwrap();

    assert_eq!(storage.lock_table_len(), 0);
}

#[tokio::test]
async fn test_cancelled_waiter_leaves_no_lock_entry() {
    let storage = MemoryStorage::new();

    let mut first = storage.begin_transaction().await.unwrap();
    first.lock(CF_AUTH_TOKENS, "abc").await.unwrap();

    let mut second = storage.begin_transaction().await.unwrap();
    let mut waiter = Box::pin(second.lock(CF_AUTH_TOKENS, "abc"));
    let blocked = tokio::time::timeout(Duration::from_millis(20), waiter.as_mut()).await;
    assert!(blocked.is_err());

    // the queued waiter still references the row
    first.rollback();
    assert_eq!(storage.lock_table_len(), 1);

    drop(waiter);
    assert_eq!(storage.lock_table_len(), 0);
}

#[tokio::test]
async fn test_unique_insert_rechecked_at_commit() {
    let storage = MemoryStorage::new();

    let mut inserter = storage.begin_transaction().await.unwrap();
    inserter.insert(CF_AUTH_TOKENS, "abc", &1u32).await.unwrap();

    // A blind put does not take the row lock
    let mut writer = storage.begin_transaction().await.unwrap();
    writer.put(CF_AUTH_TOKENS, "abc", &2u32).unwrap();
    writer.commit().await.unwrap();

    assert!(matches!(
        inserter.commit().await,
        Err(StorageError::AlreadyExists)
    ));

    let mut tx = storage.begin_transaction().await.unwrap();
    let value: Option<u32> = tx.get(CF_AUTH_TOKENS, "abc").await.unwrap();
    assert_eq!(value, Some(2));
}

#[tokio::test]
async fn test_scan_prefix_merges_pending_writes() {
    let storage = MemoryStorage::new();
    let user = uuid::Uuid::new_v4();
    let other = uuid::Uuid::new_v4();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.put(CF_REFRESH_TOKENS_BY_USER, &(user, "h1"), &()).unwrap();
    tx.put(CF_REFRESH_TOKENS_BY_USER, &(user, "h2"), &()).unwrap();
    tx.put(CF_REFRESH_TOKENS_BY_USER, &(other, "h3"), &()).unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin_transaction().await.unwrap();
    tx.delete(CF_REFRESH_TOKENS_BY_USER, &(user, "h1")).unwrap();
    tx.put(CF_REFRESH_TOKENS_BY_USER, &(user, "h4"), &()).unwrap();

    let rows: Vec<(Vec<u8>, ())> = tx
        .scan_prefix(CF_REFRESH_TOKENS_BY_USER, &user)
        .await
        .unwrap();
    let keys: Vec<(uuid::Uuid, String)> = rows
        .iter()
        .map(|(key, _)| traits::deserialize_value(key).unwrap())
        .collect();

    assert_eq!(
        keys,
        vec![(user, "h2".to_string()), (user, "h4".to_string())]
    );
}
