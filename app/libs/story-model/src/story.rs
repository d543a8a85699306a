use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};

/// Largest photo accepted for upload (5 MiB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Content types the story API accepts for `photo`.
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// A remote-confirmed story as returned by the story API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub name: String,
    pub description: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Story {
    /// Location of the story, only when both coordinates are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

/// Decimal-degree location. Latitude and longitude travel together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> ModelResult<Self> {
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        if !in_range {
            return Err(ModelError::InvalidCoordinates { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Raw photo payload of a story that has not reached the server yet.
#[derive(Clone, PartialEq)]
pub struct Photo {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.bytes.is_empty() {
            return Err(ModelError::MissingPhoto);
        }
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_PHOTO_TYPES.contains(&content_type.as_str()) {
            return Err(ModelError::UnsupportedPhotoType(self.content_type.clone()));
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(ModelError::PhotoTooLarge {
                size: self.bytes.len(),
                limit: MAX_PHOTO_BYTES,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Photo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A pending story. `local_id` is a surrogate that never leaves the device.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub local_id: Uuid,
    pub description: String,
    pub photo: Photo,
    pub coordinates: Option<Coordinates>,
}

impl NewStory {
    /// Build a validated pending story.
    pub fn new(description: impl Into<String>, photo: Photo) -> ModelResult<Self> {
        let story = Self {
            local_id: Uuid::new_v4(),
            description: description.into(),
            photo,
            coordinates: None,
        };
        story.validate()?;
        Ok(story)
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.description.trim().is_empty() {
            return Err(ModelError::EmptyDescription);
        }
        self.photo.validate()?;
        if let Some(c) = self.coordinates {
            Coordinates::new(c.lat, c.lon)?;
        }
        Ok(())
    }
}

/// A pending story sitting in the write-ahead queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Local dequeue address, strictly increasing, never sent to the server.
    pub seq: i64,
    pub story: NewStory,
    pub queued_at: DateTime<Utc>,
}

/// Independent snapshot of a remote-confirmed story saved by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(flatten)]
    pub story: Story,
    pub bookmarked_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(story: Story) -> Self {
        Self {
            story,
            bookmarked_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.story.id
    }
}

/// Row counts across the three local collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub stories: u64,
    pub queued_stories: u64,
    pub bookmarks: u64,
    pub total_items: u64,
}
