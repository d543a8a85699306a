use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use story_model::{Bookmark, Story};
use tracing::debug;

use crate::error::StoreResult;
use crate::rows::{decode_time, encode_time, story_from_row};
use crate::schema::BOOKMARKS;
use crate::LocalStore;

/// User-saved story snapshots. Rows are copies: removing a story from the
/// `stories` collection never touches its bookmark, and the reverse.
pub struct Bookmarks<'a> {
    store: &'a LocalStore,
}

impl<'a> Bookmarks<'a> {
    pub(crate) fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Save (or refresh) a snapshot of `story`.
    pub async fn put(&self, story: &Story) -> StoreResult<Bookmark> {
        let pool = self.store.pool().await?;
        let bookmark = Bookmark::new(story.clone());
        insert(&bookmark).execute(pool).await?;
        debug!(story_id = %story.id, "Bookmark saved");
        Ok(bookmark)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Bookmark>> {
        let pool = self.store.pool().await?;
        let row = sqlx::query("SELECT * FROM bookmarks WHERE id = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(|r| bookmark_from_row(&r)).transpose()
    }

    /// All bookmarks, most recently saved first.
    pub async fn get_all(&self) -> StoreResult<Vec<Bookmark>> {
        let pool = self.store.pool().await?;
        let rows = sqlx::query("SELECT * FROM bookmarks ORDER BY bookmarked_at DESC, id ASC")
            .fetch_all(pool)
            .await?;
        rows.iter().map(bookmark_from_row).collect()
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM bookmarks").execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookmarks")
            .fetch_one(pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_bookmarked(&self, id: &str) -> StoreResult<bool> {
        let pool = self.store.pool().await?;
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM bookmarks WHERE id = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Flip the bookmark state of `story`. Returns the new state.
    pub async fn toggle(&self, story: &Story) -> StoreResult<bool> {
        let pool = self.store.pool().await?;
        let mut tx = pool.begin().await?;

        let removed = sqlx::query("DELETE FROM bookmarks WHERE id = ?1")
            .bind(&story.id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            let bookmark = Bookmark::new(story.clone());
            insert(&bookmark).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(story_id = %story.id, bookmarked = !removed, "Bookmark toggled");
        Ok(!removed)
    }
}

fn insert(
    bookmark: &Bookmark,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    let story = &bookmark.story;
    sqlx::query(
        r#"
        INSERT INTO bookmarks (id, name, description, photo_url, created_at, lat, lon, bookmarked_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            photo_url = excluded.photo_url,
            created_at = excluded.created_at,
            lat = excluded.lat,
            lon = excluded.lon,
            bookmarked_at = excluded.bookmarked_at
        "#,
    )
    .bind(&story.id)
    .bind(&story.name)
    .bind(&story.description)
    .bind(&story.photo_url)
    .bind(encode_time(&story.created_at))
    .bind(story.lat)
    .bind(story.lon)
    .bind(encode_time(&bookmark.bookmarked_at))
}

fn bookmark_from_row(row: &SqliteRow) -> StoreResult<Bookmark> {
    let bookmarked_at: String = row.try_get("bookmarked_at")?;
    Ok(Bookmark {
        story: story_from_row(BOOKMARKS, row)?,
        bookmarked_at: decode_time(BOOKMARKS, &bookmarked_at)?,
    })
}
