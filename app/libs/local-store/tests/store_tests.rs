//! Integration tests for the local store.
//!
//! Every test works on a throwaway SQLite file inside a temp directory, so
//! durability across reopen is exercised the same way a page reload or a
//! worker restart would.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use error_types::{Classify, ErrorClass};
use local_store::{schema, LocalStore, StoreConfig, StoreError};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use story_model::{Coordinates, NewStory, Photo, Story};
use tempfile::TempDir;

fn story(id: &str, minutes: i64) -> Story {
    Story {
        id: id.to_string(),
        name: format!("author of {id}"),
        description: format!("description of {id}"),
        photo_url: format!("https://story-api.dicoding.dev/images/{id}.jpg"),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + ChronoDuration::minutes(minutes),
        lat: None,
        lon: None,
    }
}

fn pending(description: &str) -> NewStory {
    NewStory::new(
        description,
        Photo::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]),
    )
    .unwrap()
}

async fn open_in(dir: &TempDir) -> LocalStore {
    LocalStore::open(StoreConfig::file(dir.path().join("story-app.db")))
        .await
        .expect("Failed to open local store")
}

#[tokio::test]
async fn test_story_upsert_overwrites_by_id() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    store.stories().put(&story("s1", 0)).await.unwrap();
    let mut updated = story("s1", 0);
    updated.description = "edited".to_string();
    store.stories().put(&updated).await.unwrap();

    assert_eq!(store.stories().count().await.unwrap(), 1);
    let fetched = store.stories().get("s1").await.unwrap().unwrap();
    assert_eq!(fetched.description, "edited");
}

#[tokio::test]
async fn test_get_all_returns_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    for (id, minutes) in [("old", 0), ("new", 10), ("mid", 5)] {
        store.stories().put(&story(id, minutes)).await.unwrap();
    }

    let ids: Vec<String> = store
        .stories()
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[tokio::test]
async fn test_put_all_is_upsert_not_replace() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    store.stories().put(&story("kept", 0)).await.unwrap();
    store
        .stories()
        .put_all(&[story("t1", 1), story("t2", 2)])
        .await
        .unwrap();

    assert_eq!(store.stories().count().await.unwrap(), 3);
    assert!(store.stories().get("kept").await.unwrap().is_some());
}

#[tokio::test]
async fn test_story_location_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let mut located = story("geo", 0);
    located.lat = Some(-6.2);
    located.lon = Some(106.816);
    store.stories().put(&located).await.unwrap();

    let fetched = store.stories().get("geo").await.unwrap().unwrap();
    assert_eq!(fetched, located);
}

#[tokio::test]
async fn test_delete_and_clear_stories() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    store.stories().put(&story("a", 0)).await.unwrap();
    store.stories().put(&story("b", 1)).await.unwrap();

    assert!(store.stories().delete("a").await.unwrap());
    assert!(!store.stories().delete("a").await.unwrap());
    assert_eq!(store.stories().clear().await.unwrap(), 1);
    assert!(store.stories().get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_queue_preserves_enqueue_order() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let mut seqs = Vec::new();
    for description in ["first", "second", "third"] {
        seqs.push(store.queue().enqueue(&pending(description)).await.unwrap().seq);
    }
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));

    let descriptions: Vec<String> = store
        .queue()
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.story.description)
        .collect();
    assert_eq!(descriptions, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_queue_delete_removes_exactly_one_entry() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let a = store.queue().enqueue(&pending("a")).await.unwrap();
    let b = store.queue().enqueue(&pending("b")).await.unwrap();
    let c = store.queue().enqueue(&pending("c")).await.unwrap();

    assert!(store.queue().delete(b.seq).await.unwrap());

    let remaining: Vec<i64> = store
        .queue()
        .get_all()
        .await
        .unwrap()
        .iter()
        .map(|e| e.seq)
        .collect();
    assert_eq!(remaining, vec![a.seq, c.seq]);
}

#[tokio::test]
async fn test_queue_entry_keeps_payload() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let story = pending("with location").with_coordinates(Coordinates::new(-6.2, 106.8).unwrap());
    let entry = store.queue().enqueue(&story).await.unwrap();

    let fetched = store.queue().get(entry.seq).await.unwrap().unwrap();
    assert_eq!(fetched.story, story);
    assert_eq!(fetched.story.photo.bytes, vec![0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_enqueue_same_story_twice_keeps_one_entry() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let story = pending("once");
    let first = store.queue().enqueue(&story).await.unwrap();
    let second = store.queue().enqueue(&story).await.unwrap();

    assert_eq!(first.seq, second.seq);
    assert_eq!(store.queue().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_queue_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_in(&dir).await;
        store.queue().enqueue(&pending("one")).await.unwrap();
        store.queue().enqueue(&pending("two")).await.unwrap();
        store.close().await;
    }

    let reopened = open_in(&dir).await;
    let entries = reopened.queue().get_all().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].story.description, "one");
}

#[tokio::test]
async fn test_bookmark_survives_story_deletion() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let s = story("s1", 0);
    store.stories().put(&s).await.unwrap();
    store.bookmarks().put(&s).await.unwrap();

    store.stories().delete("s1").await.unwrap();
    assert!(store.bookmarks().is_bookmarked("s1").await.unwrap());
    assert_eq!(store.bookmarks().get("s1").await.unwrap().unwrap().story, s);

    store.stories().clear().await.unwrap();
    assert_eq!(store.bookmarks().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_story_survives_bookmark_deletion() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let s = story("s1", 0);
    store.stories().put(&s).await.unwrap();
    store.bookmarks().put(&s).await.unwrap();

    store.bookmarks().delete("s1").await.unwrap();
    assert!(!store.bookmarks().is_bookmarked("s1").await.unwrap());
    assert!(store.stories().get("s1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_bookmark_toggle() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;
    let s = story("s1", 0);

    assert!(store.bookmarks().toggle(&s).await.unwrap());
    assert!(store.bookmarks().is_bookmarked("s1").await.unwrap());
    assert!(!store.bookmarks().toggle(&s).await.unwrap());
    assert!(!store.bookmarks().is_bookmarked("s1").await.unwrap());
}

#[tokio::test]
async fn test_storage_info_and_clear_all() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    store.stories().put(&story("a", 0)).await.unwrap();
    store.stories().put(&story("b", 1)).await.unwrap();
    store.queue().enqueue(&pending("q")).await.unwrap();
    store.bookmarks().put(&story("a", 0)).await.unwrap();

    let info = store.storage_info().await.unwrap();
    assert_eq!(info.stories, 2);
    assert_eq!(info.queued_stories, 1);
    assert_eq!(info.bookmarks, 1);
    assert_eq!(info.total_items, 4);

    store.clear_all().await.unwrap();
    assert_eq!(store.storage_info().await.unwrap().total_items, 0);
}

#[tokio::test]
async fn test_concurrent_first_use_initializes_once() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(StoreConfig::file(dir.path().join("lazy.db")));
    assert!(!store.is_open());

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.stories().put(&story(&format!("s{i}"), i)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(store.is_open());
    assert_eq!(store.initializations(), 1);
    assert_eq!(store.stories().count().await.unwrap(), 10);
}

#[tokio::test]
async fn test_concurrent_writes_to_same_key_last_write_wins() {
    let dir = TempDir::new().unwrap();
    let store = open_in(&dir).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut s = story("contended", 0);
            s.description = format!("writer {i}");
            store.stories().put(&s).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.stories().count().await.unwrap(), 1);
    let winner = store.stories().get("contended").await.unwrap().unwrap();
    assert!(winner.description.starts_with("writer "));
}

#[tokio::test]
async fn test_upgrade_creates_missing_collections_without_touching_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");

    // A database that predates the queue and bookmarks collections.
    {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
        .unwrap();
        sqlx::query(
            "CREATE TABLE stories (id TEXT PRIMARY KEY NOT NULL, name TEXT NOT NULL, \
             description TEXT NOT NULL, photo_url TEXT NOT NULL, created_at TEXT NOT NULL, \
             lat REAL, lon REAL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO stories VALUES ('legacy', 'n', 'd', 'u', '2024-01-01T00:00:00.000Z', NULL, NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
    }

    let store = LocalStore::open(StoreConfig::file(&path)).await.unwrap();
    assert!(store.stories().get("legacy").await.unwrap().is_some());
    store.queue().enqueue(&pending("new")).await.unwrap();
    store.bookmarks().put(&story("b", 0)).await.unwrap();

    let pool = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&path))
        .await
        .unwrap();
    assert_eq!(
        schema::current_version(&pool).await.unwrap(),
        schema::SCHEMA_VERSION
    );
}

#[tokio::test]
async fn test_newer_schema_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.db");
    {
        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await
        .unwrap();
        sqlx::query("PRAGMA user_version = 99")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    let err = LocalStore::open(StoreConfig::file(&path))
        .await
        .err()
        .expect("newer schema must be refused");
    assert!(matches!(
        err,
        StoreError::SchemaTooNew {
            found: 99,
            supported: 1
        }
    ));
}

#[tokio::test]
async fn test_unreachable_storage_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"plain file").unwrap();

    let store = LocalStore::new(StoreConfig::file(blocker.join("story-app.db")));
    let err = store.stories().get_all().await.unwrap_err();

    assert!(matches!(err, StoreError::Unavailable(_)));
    assert_eq!(err.class(), ErrorClass::StorageUnavailable);
    assert!(!store.is_open());
}

#[tokio::test]
async fn test_in_memory_store_keeps_data_across_operations() {
    let store = LocalStore::open(StoreConfig::in_memory()).await.unwrap();
    store.stories().put(&story("mem", 0)).await.unwrap();
    store.queue().enqueue(&pending("mem")).await.unwrap();

    assert_eq!(store.storage_info().await.unwrap().total_items, 2);
}
