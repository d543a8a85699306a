//! Shared doubles for the offline-sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use story_gateway::{Accepted, GatewayError, GatewayResult, StoryApi};
use story_model::{NewStory, Photo, Story};
use tokio::sync::Notify;

/// What the fake server does with a story, keyed by description.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Accept,
    Network,
    Status(u16),
    Unauthorized,
    /// Never answers.
    Hang,
    /// Accepts once [`FakeApi::open_gate`] is called.
    Gated,
}

pub struct FakeApi {
    outcomes: Mutex<HashMap<String, Outcome>>,
    feed: Mutex<Result<Vec<Story>, Outcome>>,
    create_calls: AtomicUsize,
    list_calls: AtomicUsize,
    delivered: Mutex<Vec<String>>,
    gate: Notify,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            feed: Mutex::new(Ok(Vec::new())),
            create_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
            gate: Notify::new(),
        }
    }

    pub fn on(&self, description: &str, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(description.to_string(), outcome);
    }

    pub fn reset_outcomes(&self) {
        self.outcomes.lock().unwrap().clear();
    }

    pub fn serve_feed(&self, stories: Vec<Story>) {
        *self.feed.lock().unwrap() = Ok(stories);
    }

    pub fn fail_feed(&self, outcome: Outcome) {
        *self.feed.lock().unwrap() = Err(outcome);
    }

    pub fn open_gate(&self) {
        self.gate.notify_one();
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Descriptions accepted so far, in delivery order.
    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

async fn fail(outcome: Outcome) -> GatewayError {
    match outcome {
        Outcome::Network | Outcome::Accept | Outcome::Gated => {
            GatewayError::NetworkUnavailable("connection refused".to_string())
        }
        Outcome::Status(status) => GatewayError::RemoteRejected {
            status,
            message: format!("status {status}"),
        },
        Outcome::Unauthorized => GatewayError::AuthRequired("Missing authentication".to_string()),
        Outcome::Hang => {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }
}

#[async_trait]
impl StoryApi for FakeApi {
    async fn list_stories(&self) -> GatewayResult<Vec<Story>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let feed = self.feed.lock().unwrap().clone();
        match feed {
            Ok(stories) => Ok(stories),
            Err(outcome) => Err(fail(outcome).await),
        }
    }

    async fn create_story(&self, story: &NewStory) -> GatewayResult<Accepted> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(&story.description)
            .copied()
            .unwrap_or(Outcome::Accept);

        if let Outcome::Gated = outcome {
            self.gate.notified().await;
        }

        match outcome {
            Outcome::Accept | Outcome::Gated => {
                self.delivered
                    .lock()
                    .unwrap()
                    .push(story.description.clone());
                Ok(Accepted {
                    message: "success".to_string(),
                    story: None,
                })
            }
            other => Err(fail(other).await),
        }
    }
}

pub fn new_story(description: &str) -> NewStory {
    NewStory::new(
        description,
        Photo::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]),
    )
    .unwrap()
}

pub fn story(id: &str, description: &str, minute: u32) -> Story {
    Story {
        id: id.to_string(),
        name: "Dimas".to_string(),
        description: description.to_string(),
        photo_url: format!("https://story-api.dicoding.dev/images/{id}.png"),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        lat: None,
        lon: None,
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
