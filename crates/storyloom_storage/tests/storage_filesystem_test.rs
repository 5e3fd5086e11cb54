//! Tests for the filesystem key-value backend.

use storyloom_interface::{KeyValueStore, StateKey, WriteBatch};
use storyloom_storage::{FileSystemStore, InMemoryStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_put_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    assert_eq!(store.get(StateKey::Story).await.unwrap(), None);

    store
        .apply(
            WriteBatch::new()
                .put(StateKey::Story, "{\"text\":\"a b c\"}\n")
                .put(StateKey::Cursor, "{}"),
        )
        .await
        .unwrap();

    assert_eq!(
        store.get(StateKey::Story).await.unwrap().as_deref(),
        Some("{\"text\":\"a b c\"}\n")
    );
    assert_eq!(store.get(StateKey::Cursor).await.unwrap().as_deref(), Some("{}"));
    assert!(temp_dir.path().join("story.ndjson").exists());
}

#[tokio::test]
async fn test_remove_missing_key_is_ok() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    store
        .apply(WriteBatch::new().remove(StateKey::UsedPhrases))
        .await
        .unwrap();
    assert_eq!(store.get(StateKey::UsedPhrases).await.unwrap(), None);
}

#[tokio::test]
async fn test_batch_removes_all_keys_together() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    store
        .apply(
            WriteBatch::new()
                .put(StateKey::Story, "story")
                .put(StateKey::Cursor, "cursor")
                .put(StateKey::UsedPhrases, "used"),
        )
        .await
        .unwrap();

    store
        .apply(
            WriteBatch::new()
                .remove(StateKey::Story)
                .remove(StateKey::Cursor)
                .remove(StateKey::UsedPhrases),
        )
        .await
        .unwrap();

    for key in [StateKey::Story, StateKey::Cursor, StateKey::UsedPhrases] {
        assert_eq!(store.get(key).await.unwrap(), None);
    }
    assert!(!temp_dir.path().join(".txn").read_dir().unwrap().any(|_| true));
}

#[tokio::test]
async fn test_last_write_in_batch_wins() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    store
        .apply(
            WriteBatch::new()
                .put(StateKey::Story, "first")
                .remove(StateKey::Story)
                .put(StateKey::Story, "second"),
        )
        .await
        .unwrap();

    assert_eq!(
        store.get(StateKey::Story).await.unwrap().as_deref(),
        Some("second")
    );
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = FileSystemStore::new(temp_dir.path()).unwrap();
        store
            .apply(WriteBatch::new().put(StateKey::Cursor, "persisted"))
            .await
            .unwrap();
    }

    let reopened = FileSystemStore::new(temp_dir.path()).unwrap();
    assert_eq!(
        reopened.get(StateKey::Cursor).await.unwrap().as_deref(),
        Some("persisted")
    );
}

#[tokio::test]
async fn test_committed_transaction_is_replayed_on_open() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("story.ndjson"), "old story").unwrap();
    std::fs::write(temp_dir.path().join("cursor.json"), "old cursor").unwrap();

    // Crash after the commit point, before the values were moved into place
    let txn = temp_dir.path().join(".txn").join("0000-interrupted");
    std::fs::create_dir_all(&txn).unwrap();
    std::fs::write(txn.join("story.ndjson"), "new story").unwrap();
    std::fs::write(
        txn.join("COMMIT"),
        r#"{"ops":[{"key":"story","remove":false},{"key":"cursor","remove":true}]}"#,
    )
    .unwrap();

    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    assert_eq!(
        store.get(StateKey::Story).await.unwrap().as_deref(),
        Some("new story")
    );
    assert_eq!(store.get(StateKey::Cursor).await.unwrap(), None);
    assert!(!txn.exists());
}

#[tokio::test]
async fn test_uncommitted_transaction_is_discarded_on_open() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("story.ndjson"), "old story").unwrap();

    // Crash while staging: no commit marker yet
    let txn = temp_dir.path().join(".txn").join("0000-torn");
    std::fs::create_dir_all(&txn).unwrap();
    std::fs::write(txn.join("story.ndjson"), "half writ").unwrap();

    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    assert_eq!(
        store.get(StateKey::Story).await.unwrap().as_deref(),
        Some("old story")
    );
    assert!(!txn.exists());
}

#[tokio::test]
async fn test_in_memory_store_applies_batches() {
    let store = InMemoryStore::new();
    assert!(store.is_empty().await);

    store
        .apply(
            WriteBatch::new()
                .put(StateKey::Story, "story")
                .put(StateKey::Cursor, "cursor"),
        )
        .await
        .unwrap();
    assert_eq!(store.len().await, 2);

    store
        .apply(WriteBatch::new().remove(StateKey::Cursor))
        .await
        .unwrap();
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.get(&StateKey::Story).map(String::as_str), Some("story"));
    assert!(!snapshot.contains_key(&StateKey::Cursor));
}
