//! Store-level tests against a real on-disk sqlite-vec database.

mod common;

use common::HashEmbedding;
use serde_json::json;
use sitechat::store::{ChunkDocument, SqliteChunkStore};

fn doc(id: &str, url: &str, index: usize, content: &str) -> ChunkDocument {
    ChunkDocument {
        id: id.to_string(),
        url: url.to_string(),
        chunk_index: index,
        content: content.to_string(),
        metadata: json!({ "len": content.chars().count(), "overlap": 0, "index": index }),
    }
}

fn axis(direction: usize) -> Vec<f32> {
    let mut vector = vec![0.0; 8];
    vector[direction] = 1.0;
    vector
}

async fn open_store(dir: &tempfile::TempDir) -> SqliteChunkStore<HashEmbedding> {
    let path = dir.path().join("chunks.sqlite3");
    SqliteChunkStore::open(&path, &HashEmbedding)
        .await
        .expect("store should open")
}

#[tokio::test]
async fn appends_and_counts_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    assert_eq!(store.count().await.unwrap(), 0);

    store
        .add_chunks(vec![
            (doc("a", "https://example.com/one", 0, "first chunk"), axis(0)),
            (doc("b", "https://example.com/one", 1, "second chunk"), axis(1)),
        ])
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn search_orders_by_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    store
        .add_chunks(vec![
            (doc("a", "https://example.com", 0, "about llamas"), axis(0)),
            (doc("b", "https://example.com", 1, "about rivers"), axis(1)),
            (doc("c", "https://example.com", 2, "about bridges"), axis(2)),
        ])
        .await
        .unwrap();

    let results = store.search_similar(&axis(1), 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.id, "b");
    assert!(results[0].score > results[1].score);
    assert!((results[0].score - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn duplicate_content_is_stored_twice() {
    // Re-scraping a page appends a second set of rows; nothing dedups.
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let url = "https://example.com/page";
    store
        .add_chunks(vec![(doc("first", url, 0, "same text"), axis(0))])
        .await
        .unwrap();
    store
        .add_chunks(vec![(doc("second", url, 0, "same text"), axis(0))])
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 2);
    let rows = store.chunks_for_url(url).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.content == "same text"));
}

#[tokio::test]
async fn readback_preserves_order_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let url = "https://example.com/doc";
    store
        .add_chunks(vec![
            (doc("b", url, 1, "second"), axis(1)),
            (doc("a", url, 0, "first"), axis(0)),
        ])
        .await
        .unwrap();

    let rows = store.chunks_for_url(url).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].chunk_index, 0);
    assert_eq!(rows[1].chunk_index, 1);
    assert_eq!(rows[0].metadata["len"], json!(5));
}

#[tokio::test]
async fn empty_batch_and_empty_store_are_fine() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    store.add_chunks(Vec::new()).await.unwrap();
    let results = store.search_similar(&axis(0), 4).await.unwrap();
    assert!(results.is_empty());
}
