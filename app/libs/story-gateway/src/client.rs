//! reqwest-backed implementation of the story API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use story_model::{NewStory, Story};
use tracing::{debug, info, warn};

use crate::api::{Accepted, StoryApi};
use crate::auth::{CredentialProvider, Credentials, LoginResult, TokenStore};
use crate::error::{GatewayError, GatewayResult};

pub const DEFAULT_BASE_URL: &str = "https://story-api.dicoding.dev/v1";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API root, without trailing slash (e.g. `https://host/v1`).
    pub base_url: String,
    /// Per-request timeout. Expiry surfaces as `NetworkUnavailable`.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Envelope shared by every story API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryList {
    #[serde(default)]
    list_story: Vec<Story>,
}

#[derive(Debug, Deserialize)]
struct CreatedStory {
    #[serde(default)]
    story: Option<Story>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody {
    login_result: LoginResult,
}

#[derive(Debug, Deserialize)]
struct Empty {}

#[derive(Debug, Serialize)]
struct RegisterForm<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// HTTP client for the story API.
pub struct HttpStoryGateway {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl HttpStoryGateway {
    pub fn new(config: GatewayConfig, tokens: TokenStore) -> GatewayResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /login`. Does not touch the token store; see
    /// [`CredentialProvider::authenticate`] for that.
    pub async fn login(&self, credentials: &Credentials) -> GatewayResult<LoginResult> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(credentials)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let message = error_message(response, "Login failed").await;
            return Err(GatewayError::InvalidCredentials(message));
        }

        let body: LoginBody = decode(response, "Login failed").await?;
        info!(user_id = %body.login_result.user_id, "Logged in");
        Ok(body.login_result)
    }

    /// `POST /register`. Returns the server message.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> GatewayResult<String> {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&RegisterForm {
                name,
                email,
                password,
            })
            .send()
            .await?;

        let envelope: Envelope<Empty> = decode_envelope(response, "Registration failed").await?;
        Ok(envelope.message)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> GatewayResult<String> {
        self.tokens.get().ok_or_else(|| {
            GatewayError::AuthRequired("no token found, log in first".to_string())
        })
    }
}

#[async_trait]
impl StoryApi for HttpStoryGateway {
    async fn list_stories(&self) -> GatewayResult<Vec<Story>> {
        let token = self.bearer()?;
        let response = self
            .client
            .get(self.url("/stories"))
            .query(&[("location", "1")])
            .bearer_auth(token)
            .send()
            .await?;

        let body: StoryList = decode(response, "Failed to fetch stories").await?;
        debug!(count = body.list_story.len(), "Fetched stories");
        Ok(body.list_story)
    }

    async fn create_story(&self, story: &NewStory) -> GatewayResult<Accepted> {
        let token = self.bearer()?;

        let photo = Part::bytes(story.photo.bytes.clone())
            .file_name(story.photo.file_name.clone())
            .mime_str(&story.photo.content_type)
            .map_err(|e| GatewayError::Decode(format!("invalid photo content type: {e}")))?;
        let mut form = Form::new()
            .text("description", story.description.clone())
            .part("photo", photo);
        if let Some(c) = story.coordinates {
            form = form.text("lat", c.lat.to_string()).text("lon", c.lon.to_string());
        }

        let response = self
            .client
            .post(self.url("/stories"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let envelope: Envelope<CreatedStory> =
            decode_envelope(response, "Failed to send story").await?;
        info!(local_id = %story.local_id, "Story accepted by server");
        Ok(Accepted {
            message: envelope.message,
            story: envelope.body.story,
        })
    }
}

#[async_trait]
impl CredentialProvider for HttpStoryGateway {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<String> {
        let result = self.login(credentials).await?;
        self.tokens.set(result.token.clone());
        Ok(result.token)
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> GatewayResult<T> {
    decode_envelope::<T>(response, fallback)
        .await
        .map(|envelope| envelope.body)
}

/// Map a response to its envelope, turning non-success statuses and
/// `error: true` bodies into gateway errors.
async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> GatewayResult<Envelope<T>> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        let message = error_message(response, fallback).await;
        return Err(GatewayError::AuthRequired(message));
    }
    if !status.is_success() {
        let message = error_message(response, fallback).await;
        warn!(status = status.as_u16(), message = %message, "Story API rejected request");
        return Err(GatewayError::RemoteRejected {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    let envelope: Envelope<T> =
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))?;
    if envelope.error {
        let message = if envelope.message.is_empty() {
            fallback.to_string()
        } else {
            envelope.message
        };
        return Err(GatewayError::RemoteRejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(envelope)
}

/// The server's `message` field, or `fallback` when the body is not JSON.
async fn error_message(response: Response, fallback: &str) -> String {
    #[derive(Deserialize)]
    struct ApiMessage {
        message: Option<String>,
    }

    match response.json::<ApiMessage>().await {
        Ok(ApiMessage {
            message: Some(message),
        }) if !message.is_empty() => message,
        _ => fallback.to_string(),
    }
}
