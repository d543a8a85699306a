//! Data model for the offline story engine.
//!
//! A story exists in exactly one of two shapes:
//! - [`Story`]: remote-confirmed, carries the server id, photo URL and
//!   creation time;
//! - [`NewStory`]: pending, carries a local surrogate id and the raw photo.
//!
//! The two are never merged. Delivering a [`NewStory`] produces a new
//! [`Story`] on the server; the pending value is dropped from the queue.

mod error;
mod story;

pub use error::{ModelError, ModelResult};
pub use story::{
    Bookmark, Coordinates, NewStory, Photo, QueueEntry, StorageInfo, Story, ALLOWED_PHOTO_TYPES,
    MAX_PHOTO_BYTES,
};
