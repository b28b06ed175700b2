//! Slack Web API client module.
//!
//! This module provides the `SlackClient` for issuing authenticated calls
//! against `slack.com/api` using the session credential pair recovered by
//! the auth module (bearer `xoxc-` token plus `xoxd-` session cookie).

pub mod client;
pub mod error;

pub use client::{SlackClient, API_BASE_URL};
pub use error::ApiError;
