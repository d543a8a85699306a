//! SQLite-backed cache storage that survives restarts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{CacheError, CacheResult};
use crate::response::{CachedEntry, CapturedResponse};
use crate::storage::CacheStorage;

const CREATE_TABLES: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS cache_names (
        name TEXT PRIMARY KEY NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cache_entries (
        cache_name TEXT NOT NULL,
        url TEXT NOT NULL,
        status INTEGER NOT NULL,
        headers TEXT NOT NULL,
        body BLOB NOT NULL,
        stored_at TEXT NOT NULL,
        PRIMARY KEY (cache_name, url)
    )
    "#,
];

pub struct SqliteCacheStorage {
    pool: SqlitePool,
}

impl SqliteCacheStorage {
    /// Open (or create) a cache database file.
    pub async fn open_file(path: impl AsRef<Path>) -> CacheResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        info!(path = %path.as_ref().display(), "Cache storage opened");
        Self::with_pool(pool).await
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> CacheResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the cache tables if missing.
    pub async fn with_pool(pool: SqlitePool) -> CacheResult<Self> {
        for statement in CREATE_TABLES {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CacheStorage for SqliteCacheStorage {
    async fn open(&self, cache: &str) -> CacheResult<()> {
        sqlx::query("INSERT OR IGNORE INTO cache_names (name, created_at) VALUES (?, ?)")
            .bind(cache)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn put(&self, cache: &str, url: &str, response: &CapturedResponse) -> CacheResult<()> {
        let headers = serde_json::to_string(&response.headers).map_err(|e| CacheError::Corrupt {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT OR IGNORE INTO cache_names (name, created_at) VALUES (?, ?)")
            .bind(cache)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO cache_entries (cache_name, url, status, headers, body, stored_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (cache_name, url) DO UPDATE SET
                status = excluded.status,
                headers = excluded.headers,
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(cache)
        .bind(url)
        .bind(i64::from(response.status))
        .bind(headers)
        .bind(&response.body)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(cache = %cache, url = %url, bytes = response.body.len(), "Cache entry stored");
        Ok(())
    }

    async fn get(&self, cache: &str, url: &str) -> CacheResult<Option<CachedEntry>> {
        let row = sqlx::query(
            "SELECT url, status, headers, body, stored_at FROM cache_entries WHERE cache_name = ? AND url = ?",
        )
        .bind(cache)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| entry_from_row(&row)).transpose()
    }

    async fn keys(&self, cache: &str) -> CacheResult<Vec<String>> {
        let rows = sqlx::query("SELECT url FROM cache_entries WHERE cache_name = ? ORDER BY url")
            .bind(cache)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("url").map_err(CacheError::from))
            .collect()
    }

    async fn cache_names(&self) -> CacheResult<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM cache_names ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(CacheError::from))
            .collect()
    }

    async fn delete_cache(&self, cache: &str) -> CacheResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cache_entries WHERE cache_name = ?")
            .bind(cache)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM cache_names WHERE name = ?")
            .bind(cache)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(removed > 0)
    }
}

fn entry_from_row(row: &SqliteRow) -> CacheResult<CachedEntry> {
    let url: String = row.try_get("url")?;
    let status: i64 = row.try_get("status")?;
    let headers: String = row.try_get("headers")?;
    let stored_at: DateTime<Utc> = row.try_get("stored_at")?;

    let status = u16::try_from(status).map_err(|_| CacheError::Corrupt {
        url: url.clone(),
        reason: format!("status {status} out of range"),
    })?;
    let headers = serde_json::from_str(&headers).map_err(|e| CacheError::Corrupt {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    Ok(CachedEntry {
        response: CapturedResponse {
            status,
            headers,
            body: row.try_get("body")?,
        },
        url,
        stored_at,
    })
}
