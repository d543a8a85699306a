//! Feed loading with local fallback.

use error_types::{Classify, ErrorClass};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use local_store::LocalStore;
use story_gateway::StoryApi;
use story_model::Story;

/// Why the feed came from the local mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackCause {
    /// The server answered with an empty list.
    EmptyRemote,
    Failed { class: ErrorClass, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeedState {
    Fresh { stories: Vec<Story> },
    Degraded { stories: Vec<Story>, cause: FallbackCause },
    NoData,
}

impl FeedState {
    pub fn stories(&self) -> &[Story] {
        match self {
            FeedState::Fresh { stories } | FeedState::Degraded { stories, .. } => stories,
            FeedState::NoData => &[],
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, FeedState::Fresh { .. })
    }
}

pub struct FeedLoader {
    api: Arc<dyn StoryApi>,
    store: LocalStore,
}

impl FeedLoader {
    pub fn new(api: Arc<dyn StoryApi>, store: LocalStore) -> Self {
        Self { api, store }
    }

    /// Remote feed when available, mirrored locally; the local mirror
    /// otherwise. Never fails.
    pub async fn load(&self) -> FeedState {
        let cause = match self.api.list_stories().await {
            Ok(stories) if !stories.is_empty() => {
                if let Err(e) = self.store.stories().put_all(&stories).await {
                    warn!(error = %e, "Failed to mirror stories locally");
                }
                debug!(count = stories.len(), "Feed loaded from server");
                return FeedState::Fresh { stories };
            }
            Ok(_) => FallbackCause::EmptyRemote,
            Err(e) => FallbackCause::Failed {
                class: e.class(),
                message: e.to_string(),
            },
        };

        match self.store.stories().get_all().await {
            Ok(stories) if !stories.is_empty() => {
                warn!(count = stories.len(), cause = ?cause, "Serving feed from local store");
                FeedState::Degraded { stories, cause }
            }
            Ok(_) => {
                warn!(cause = ?cause, "No stories available");
                FeedState::NoData
            }
            Err(e) => {
                warn!(error = %e, cause = ?cause, "Local store unavailable, no stories");
                FeedState::NoData
            }
        }
    }
}
