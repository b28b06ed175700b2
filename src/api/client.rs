//! Client for the Slack Web API using session credentials.
//!
//! Every method is a form-encoded POST to `https://slack.com/api/<method>`
//! carrying both halves of the session credential: the `xoxc-` token as a
//! bearer header and the `xoxd-` cookie as `d=`. Responses share the
//! `{ok, error}` envelope; `ok: false` maps to [`ApiError::Slack`].

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::models::{
    AuthTest, Channel, ClientCounts, ConversationsList, HistoryResponse, Message,
    OpenedConversation, PinnedItem, PinsResponse, PostedMessage, PrefsResponse, SavedResponse,
    SearchResponse, SearchResults, StarredItem, StarsResponse, User, UserPrefs, UsersList,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the Slack Web API.
pub const API_BASE_URL: &str = "https://slack.com/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size for cursor-paginated list endpoints.
const PAGE_LIMIT: u32 = 200;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// The `{ok, error}` envelope every Web API response carries.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack Web API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    base_url: String,
    creds: Credentials,
}

impl SlackClient {
    pub fn new(creds: Credentials) -> Result<Self> {
        Self::with_base_url(creds, API_BASE_URL.to_string())
    }

    /// Client against an alternate base URL (tests, enterprise proxies).
    pub fn with_base_url(creds: Credentials, base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url,
            creds,
        })
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Issue one Web API call and parse the typed response.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.creds.token)
                .header(header::COOKIE, format!("d={}", self.creds.cookie))
                .form(&params)
                .send()
                .await
                .with_context(|| format!("Failed to send request to {}", method))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read {} response body", method))?;

                    let envelope: Envelope = serde_json::from_str(&text).map_err(|_| {
                        ApiError::InvalidResponse(format!(
                            "{} returned non-JSON body",
                            method
                        ))
                    })?;
                    if !envelope.ok {
                        return Err(ApiError::Slack {
                            method: method.to_string(),
                            error: envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
                        }
                        .into());
                    }

                    debug!(method, "API call ok");
                    return serde_json::from_str(&text)
                        .with_context(|| format!("Failed to parse {} response", method));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(method, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    // ===== Identity =====

    /// Minimal authenticated identity check.
    pub async fn auth_test(&self) -> Result<AuthTest> {
        self.call("auth.test", &[]).await
    }

    // ===== Conversations =====

    /// List conversations of the given types, following pagination cursors.
    pub async fn list_conversations(
        &self,
        types: &str,
        exclude_archived: bool,
    ) -> Result<Vec<Channel>> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![
                ("types", types.to_string()),
                ("exclude_archived", exclude_archived.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }

            let page: ConversationsList = self.call("conversations.list", &params).await?;
            channels.extend(page.channels);

            cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(channels)
    }

    /// Open (or return) the DM conversation with a user.
    pub async fn open_dm(&self, user_id: &str) -> Result<String> {
        let opened: OpenedConversation = self
            .call("conversations.open", &[("users", user_id.to_string())])
            .await?;
        Ok(opened.channel.id)
    }

    /// Recent channel history, newest first as Slack returns it.
    pub async fn history(&self, channel: &str, limit: u32) -> Result<Vec<Message>> {
        let resp: HistoryResponse = self
            .call(
                "conversations.history",
                &[
                    ("channel", channel.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(resp.messages)
    }

    /// Fetch the single message at `ts`, if visible.
    pub async fn message_at(&self, channel: &str, ts: &str) -> Result<Option<Message>> {
        let resp: HistoryResponse = self
            .call(
                "conversations.history",
                &[
                    ("channel", channel.to_string()),
                    ("latest", ts.to_string()),
                    ("inclusive", "true".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(resp.messages.into_iter().next())
    }

    /// Thread replies, parent message first.
    pub async fn replies(&self, channel: &str, ts: &str, limit: u32) -> Result<Vec<Message>> {
        let resp: HistoryResponse = self
            .call(
                "conversations.replies",
                &[
                    ("channel", channel.to_string()),
                    ("ts", ts.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(resp.messages)
    }

    // ===== Messaging =====

    /// Post a message; returns its ts.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<String> {
        let posted: PostedMessage = self
            .call(
                "chat.postMessage",
                &[("channel", channel.to_string()), ("text", text.to_string())],
            )
            .await?;
        Ok(posted.ts.unwrap_or_default())
    }

    pub async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        let _: Envelope = self
            .call(
                "reactions.add",
                &[
                    ("channel", channel.to_string()),
                    ("timestamp", ts.to_string()),
                    ("name", name.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn search_messages(&self, query: &str, count: u32) -> Result<SearchResults> {
        let resp: SearchResponse = self
            .call(
                "search.messages",
                &[("query", query.to_string()), ("count", count.to_string())],
            )
            .await?;
        Ok(resp.messages.unwrap_or_default())
    }

    // ===== Users =====

    /// All workspace members, following pagination cursors.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut members = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = vec![("limit", PAGE_LIMIT.to_string())];
            if let Some(ref c) = cursor {
                params.push(("cursor", c.clone()));
            }

            let page: UsersList = self.call("users.list", &params).await?;
            members.extend(page.members);

            cursor = page
                .response_metadata
                .and_then(|m| m.next_cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        Ok(members)
    }

    // ===== Activity & saved items =====

    /// Unread/mention counts for every open conversation.
    pub async fn client_counts(&self) -> Result<ClientCounts> {
        self.call("client.counts", &[]).await
    }

    /// The user's notification and VIP preferences.
    pub async fn user_prefs(&self) -> Result<UserPrefs> {
        let resp: PrefsResponse = self.call("users.prefs.get", &[]).await?;
        Ok(resp.prefs)
    }

    pub async fn starred_items(&self, count: u32) -> Result<Vec<StarredItem>> {
        let resp: StarsResponse = self
            .call("stars.list", &[("count", count.to_string())])
            .await?;
        Ok(resp.items)
    }

    pub async fn pinned_items(&self, channel: &str) -> Result<Vec<PinnedItem>> {
        let resp: PinsResponse = self
            .call("pins.list", &[("channel", channel.to_string())])
            .await?;
        Ok(resp.items)
    }

    pub async fn saved_items(&self, count: u32) -> Result<SavedResponse> {
        self.call("saved.list", &[("count", count.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_creds() -> Credentials {
        Credentials {
            token: "xoxc-test-token".to_string(),
            cookie: "xoxd-test-cookie".to_string(),
        }
    }

    async fn client_for(server: &MockServer) -> SlackClient {
        SlackClient::with_base_url(test_creds(), server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_call_sends_both_credential_halves() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .and(header("authorization", "Bearer xoxc-test-token"))
            .and(header("cookie", "d=xoxd-test-cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true, "user": "dave", "team": "troop53", "team_id": "T1",
                "user_id": "U1", "url": "https://troop53.slack.com/"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let identity = client.auth_test().await.unwrap();
        assert_eq!(identity.user.as_deref(), Some("dave"));
        assert_eq!(identity.team.as_deref(), Some("troop53"));
    }

    #[tokio::test]
    async fn test_ok_false_maps_to_slack_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": false, "error": "channel_not_found"}),
            ))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.post_message("C404", "hi").await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::Slack { method, error }) => {
                assert_eq!(method, "chat.postMessage");
                assert_eq!(error, "channel_not_found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth.test"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.auth_test().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_list_conversations_follows_cursor() {
        let server = MockServer::start().await;

        // First page carries a cursor; the follow-up request includes it.
        Mock::given(method("POST"))
            .and(path("/conversations.list"))
            .and(body_string_contains("cursor=NEXT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "channels": [{"id": "C2", "name": "page-two"}],
                "response_metadata": {"next_cursor": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "channels": [{"id": "C1", "name": "page-one"}],
                "response_metadata": {"next_cursor": "NEXT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let channels = client
            .list_conversations("public_channel,private_channel", true)
            .await
            .unwrap();
        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["C1", "C2"]);
    }
}
