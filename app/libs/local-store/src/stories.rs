use story_model::Story;
use tracing::debug;

use crate::error::StoreResult;
use crate::rows::{encode_time, story_from_row};
use crate::schema::STORIES;
use crate::LocalStore;

const UPSERT: &str = r#"
    INSERT INTO stories (id, name, description, photo_url, created_at, lat, lon)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        description = excluded.description,
        photo_url = excluded.photo_url,
        created_at = excluded.created_at,
        lat = excluded.lat,
        lon = excluded.lon
"#;

/// Remote-confirmed stories keyed by server id.
pub struct Stories<'a> {
    store: &'a LocalStore,
}

impl<'a> Stories<'a> {
    pub(crate) fn new(store: &'a LocalStore) -> Self {
        Self { store }
    }

    /// Insert or overwrite a story by id (last write wins).
    pub async fn put(&self, story: &Story) -> StoreResult<()> {
        let pool = self.store.pool().await?;
        bind_story(sqlx::query(UPSERT), story).execute(pool).await?;
        debug!(story_id = %story.id, "Story stored");
        Ok(())
    }

    /// Upsert a batch in one transaction. Rows not in `stories` are kept.
    pub async fn put_all(&self, stories: &[Story]) -> StoreResult<usize> {
        let pool = self.store.pool().await?;
        let mut tx = pool.begin().await?;
        for story in stories {
            bind_story(sqlx::query(UPSERT), story)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!(count = stories.len(), "Stories mirrored");
        Ok(stories.len())
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Story>> {
        let pool = self.store.pool().await?;
        let row = sqlx::query("SELECT * FROM stories WHERE id = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(|r| story_from_row(STORIES, &r)).transpose()
    }

    /// All stories, newest first.
    pub async fn get_all(&self) -> StoreResult<Vec<Story>> {
        let pool = self.store.pool().await?;
        let rows = sqlx::query("SELECT * FROM stories ORDER BY created_at DESC, id ASC")
            .fetch_all(pool)
            .await?;
        rows.iter().map(|r| story_from_row(STORIES, r)).collect()
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM stories WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let result = sqlx::query("DELETE FROM stories").execute(pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> StoreResult<u64> {
        let pool = self.store.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stories")
            .fetch_one(pool)
            .await?;
        Ok(count as u64)
    }
}

fn bind_story<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    story: &'q Story,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(&story.id)
        .bind(&story.name)
        .bind(&story.description)
        .bind(&story.photo_url)
        .bind(encode_time(&story.created_at))
        .bind(story.lat)
        .bind(story.lon)
}
