use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use story_model::{NewStory, Story};

use crate::error::GatewayResult;

/// Server acknowledgement of a created story.
///
/// The story API answers a create with a message only; `story` is filled
/// when a server echoes the created record back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accepted {
    pub message: String,
    pub story: Option<Story>,
}

/// Remote story operations used by the offline engine.
#[async_trait]
pub trait StoryApi: Send + Sync {
    /// Fetch the story feed (with locations).
    async fn list_stories(&self) -> GatewayResult<Vec<Story>>;

    /// Submit a pending story as multipart form data.
    async fn create_story(&self, story: &NewStory) -> GatewayResult<Accepted>;
}
