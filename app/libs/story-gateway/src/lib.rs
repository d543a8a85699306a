//! # Story Gateway
//!
//! Typed client for the remote story API and the only network egress point
//! for story data. It exposes:
//!
//! - [`StoryApi`]: `list_stories` / `create_story`, the seam the sync
//!   coordinator and the feed policy depend on;
//! - [`CredentialProvider`]: opaque `authenticate(credentials) -> token`;
//! - [`HttpStoryGateway`]: the reqwest-backed implementation of both, plus
//!   `register`.
//!
//! Every call is a single attempt. Retry policy belongs to the caller.

mod api;
mod auth;
mod client;
mod error;

pub use api::{Accepted, StoryApi};
pub use auth::{CredentialProvider, Credentials, LoginResult, TokenStore};
pub use client::{GatewayConfig, HttpStoryGateway, DEFAULT_BASE_URL};
pub use error::{GatewayError, GatewayResult};
