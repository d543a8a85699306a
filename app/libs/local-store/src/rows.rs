//! Row <-> model mapping shared by the collections.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use story_model::Story;

use crate::error::{StoreError, StoreResult};

/// Timestamps are stored as RFC 3339 text with millisecond precision so that
/// lexical order matches chronological order.
pub(crate) fn encode_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_time(collection: &'static str, raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            collection,
            reason: format!("bad timestamp {raw:?}: {e}"),
        })
}

/// Decode the story columns shared by `stories` and `bookmarks`.
pub(crate) fn story_from_row(collection: &'static str, row: &SqliteRow) -> StoreResult<Story> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Story {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        photo_url: row.try_get("photo_url")?,
        created_at: decode_time(collection, &created_at)?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
    })
}
