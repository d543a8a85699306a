use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use story_model::{Coordinates, NewStory, Photo, QueueEntry};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::rows::{decode_time, encode_time};
use crate::schema::QUEUED_STORIES;
use crate::LocalStore;

/// Write-ahead queue of pending submissions, addressed by sequence number.
///
/// Entries come back in enqueue order. An entry leaves the queue only through
/// [`Queue::delete`] (or [`Queue::clear`] on explicit reset).
pub struct Queue<'a> {
    store: &'a LocalStore,
}

impl<'a> Queue<'a> {
    pub(crate) fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Append a pending story.
    ///
    /// Enqueueing the same story (same `local_id`) twice keeps the first
    /// entry and returns it.
    pub async fn enqueue(&self, story: &NewStory) -> StoreResult<QueueEntry> {
        let pool = self.store.pool().await?;
        let local_id = story.local_id.to_string();
        let (lat, lon) = match story.coordinates {
            Some(c) => (Some(c.lat), Some(c.lon)),
            None => (None, None),
        };

        let mut tx = pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO queued_stories (
                local_id, description, photo_name, photo_type, photo, lat, lon, queued_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&local_id)
        .bind(&story.description)
        .bind(&story.photo.file_name)
        .bind(&story.photo.content_type)
        .bind(&story.photo.bytes)
        .bind(lat)
        .bind(lon)
        .bind(encode_time(&Utc::now()))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let row = sqlx::query("SELECT * FROM queued_stories WHERE local_id = ?1")
            .bind(&local_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        let entry = entry_from_row(&row)?;
        if inserted > 0 {
            info!(seq = entry.seq, local_id = %local_id, "Story queued for sync");
        } else {
            debug!(seq = entry.seq, local_id = %local_id, "Story already queued");
        }
        Ok(entry)
    }

    pub async fn get(&self, seq: i64) -> StoreResult<Option<QueueEntry>> {
        let pool = self.store.pool().await?;
        let row = sqlx::query("SELECT * FROM queued_stories WHERE seq = ?1")
            .bind(seq)
            .fetch_optional(pool)
            .await?;
        row.map(|r| entry_from_row(&r)).transpose()
    }

    /// All pending entries in enqueue order.
    pub async fn get_all(&self) -> StoreResult<Vec<QueueEntry>> {
        let pool = self.store.pool().await?;
        let rows = sqlx::query("SELECT * FROM queued_stories ORDER BY seq ASC")
            .fetch_all(pool)
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Remove exactly one entry. Returns whether it existed.
    pub async fn delete(&self, seq: i64) -> StoreResult<bool> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM queued_stories WHERE seq = ?1")
            .bind(seq)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM queued_stories")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queued_stories")
            .fetch_one(pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.count().await? == 0)
    }
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<QueueEntry> {
    let local_id: String = row.try_get("local_id")?;
    let local_id = Uuid::parse_str(&local_id).map_err(|e| StoreError::Corrupt {
        collection: QUEUED_STORIES,
        reason: format!("bad local id {local_id:?}: {e}"),
    })?;
    let lat: Option<f64> = row.try_get("lat")?;
    let lon: Option<f64> = row.try_get("lon")?;
    let coordinates = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
        _ => None,
    };
    let queued_at: String = row.try_get("queued_at")?;

    Ok(QueueEntry {
        seq: row.try_get("seq")?,
        story: NewStory {
            local_id,
            description: row.try_get("description")?,
            photo: Photo::new(
                row.try_get::<String, _>("photo_name")?,
                row.try_get::<String, _>("photo_type")?,
                row.try_get("photo")?,
            ),
            coordinates,
        },
        queued_at: decode_time(QUEUED_STORIES, &queued_at)?,
    })
}
