//! Versioned, additive schema.
//!
//! The version lives in `PRAGMA user_version`. Every upgrade statement is
//! create-if-missing, so running the upgrade against a database that already
//! has some collections creates the missing ones and leaves the rest (and
//! their rows) untouched.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

pub const STORIES: &str = "stories";
pub const QUEUED_STORIES: &str = "queued_stories";
pub const BOOKMARKS: &str = "bookmarks";

/// Every collection table, in creation order.
pub const COLLECTIONS: [&str; 3] = [STORIES, QUEUED_STORIES, BOOKMARKS];

/// Statements introduced by each schema version.
const UPGRADES: &[(i64, &[&str])] = &[(
    1,
    &[
        r#"
        CREATE TABLE IF NOT EXISTS stories (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            description TEXT NOT NULL,
            photo_url   TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            lat         REAL,
            lon         REAL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_stories_created_at ON stories (created_at)",
        r#"
        CREATE TABLE IF NOT EXISTS queued_stories (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            local_id    TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            photo_name  TEXT NOT NULL,
            photo_type  TEXT NOT NULL,
            photo       BLOB NOT NULL,
            lat         REAL,
            lon         REAL,
            queued_at   TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            id            TEXT PRIMARY KEY NOT NULL,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL,
            photo_url     TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            lat           REAL,
            lon           REAL,
            bookmarked_at TEXT NOT NULL
        )
        "#,
    ],
)];

/// Read the stored schema version (0 for a fresh file).
pub async fn current_version(pool: &SqlitePool) -> StoreResult<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Bring the database up to [`SCHEMA_VERSION`]. Returns the resulting version.
pub async fn upgrade(pool: &SqlitePool) -> StoreResult<i64> {
    let found = current_version(pool).await?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let mut tx = pool.begin().await?;
    // Create-if-missing is replayed for every version so that a collection
    // dropped or never created under an older version comes back.
    for (_, statements) in UPGRADES.iter().filter(|(v, _)| *v <= SCHEMA_VERSION) {
        for statement in statements.iter() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
    }
    if found < SCHEMA_VERSION {
        sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .execute(&mut *tx)
            .await?;
        info!(from = found, to = SCHEMA_VERSION, "Local store schema upgraded");
    }
    tx.commit().await?;

    Ok(SCHEMA_VERSION)
}
