use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteStore;

#[tokio::test]
async fn sqlite_roundtrip_overwrites_and_removes() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    assert_eq!(store.get("article_game_progress_state").await.unwrap(), None);

    store
        .set("article_game_progress_state", r#"{"cursor":1}"#)
        .await
        .unwrap();
    store
        .set("article_game_progress_state", r#"{"cursor":2}"#)
        .await
        .unwrap();
    assert_eq!(
        store
            .get("article_game_progress_state")
            .await
            .unwrap()
            .as_deref(),
        Some(r#"{"cursor":2}"#)
    );

    store.remove("article_game_progress_state").await.unwrap();
    store.remove("article_game_progress_state").await.unwrap();
    assert_eq!(store.get("article_game_progress_state").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_prefix_scan_is_literal_and_sorted() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_prefix?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");

    for key in [
        "article_game_snapshot:regular_2",
        "article_game_snapshot:error_1",
        "article_game_snapshotXregular_3",
        "article_game_answer_state",
    ] {
        store.set(key, "{}").await.unwrap();
    }

    let keys = store
        .keys_with_prefix("article_game_snapshot:")
        .await
        .unwrap();
    assert_eq!(
        keys,
        vec![
            "article_game_snapshot:error_1".to_owned(),
            "article_game_snapshot:regular_2".to_owned(),
        ]
    );

    // `_` is not a wildcard.
    let keys = store.keys_with_prefix("article_game_snapshot_").await.unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("first migrate");
    store.set("k", "v").await.unwrap();
    store.migrate().await.expect("second migrate");
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn storage_sqlite_wires_trait_object() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.kv.set("a", "1").await.unwrap();
    assert_eq!(storage.kv.get("a").await.unwrap().as_deref(), Some("1"));
}
