//! Credential resolution: pairing a scanned access token with the
//! decrypted session cookie and proving the pair live.

use std::time::Duration;

use anyhow::Result;
use reqwest::header;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::API_BASE_URL;

use super::cookie::CookieVault;
use super::error::AuthError;
use super::scanner::{TokenScan, TokenScanner};
use super::secret::{KeychainSecret, SecretSource};
use super::token_cache::TokenCache;
use super::workspace::SlackDataDir;

/// Timeout for the validation call. Kept short so a hung network cannot
/// stall resolution; a timeout just moves on to the next candidate.
const VALIDATE_TIMEOUT_SECS: u64 = 5;

/// A paired session credential. Both halves are required by Slack's
/// session auth model.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token, `xoxc-…`
    pub token: String,
    /// Session cookie value, `xoxd-…`
    pub cookie: String,
}

// Both halves are secrets; keep them out of debug/log output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &redact(&self.token))
            .field("cookie", &redact(&self.cookie))
            .finish()
    }
}

fn redact(secret: &str) -> String {
    let head: String = secret.chars().take(10).collect();
    format!("{}…", head)
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    ok: bool,
}

/// Orchestrates the resolution pipeline.
///
/// Order per call: in-memory memo → fresh cookie decrypt → cached token
/// (validated) → LevelDB scan with per-candidate validation. If nothing
/// validates, the highest-ranked candidate is still returned: the next real
/// API call then surfaces `invalid_auth` rather than this tool guessing.
pub struct CredentialResolver {
    secrets: Box<dyn SecretSource + Send + Sync>,
    scanner: Box<dyn TokenScan + Send + Sync>,
    vault: CookieVault,
    cache: TokenCache,
    http: reqwest::Client,
    api_base: String,
    memoized: Option<Credentials>,
}

impl CredentialResolver {
    /// Default wiring against a located Slack data directory.
    pub fn new(data_dir: &SlackDataDir, api_base: Option<String>) -> Result<Self> {
        let kind = data_dir.install_kind();
        Self::with_parts(
            Box::new(KeychainSecret::new(kind)),
            Box::new(TokenScanner::new(data_dir.leveldb_dir())),
            CookieVault::new(data_dir.cookies_db()),
            TokenCache::new()?,
            api_base.unwrap_or_else(|| API_BASE_URL.to_string()),
        )
    }

    pub fn with_parts(
        secrets: Box<dyn SecretSource + Send + Sync>,
        scanner: Box<dyn TokenScan + Send + Sync>,
        vault: CookieVault,
        cache: TokenCache,
        api_base: String,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(VALIDATE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            secrets,
            scanner,
            vault,
            cache,
            http,
            api_base,
            memoized: None,
        })
    }

    /// Resolve a credential pair.
    ///
    /// With `force_refresh` the memo and the on-disk cache are both
    /// bypassed and the LevelDB scan always runs. Note the degraded path:
    /// when candidates exist but none validates, the top-ranked one is
    /// returned unvalidated.
    pub async fn resolve(&mut self, force_refresh: bool) -> Result<Credentials, AuthError> {
        if !force_refresh {
            if let Some(creds) = &self.memoized {
                return Ok(creds.clone());
            }
        }

        // The cookie is cheap to re-derive and must track the running app's
        // current session, so it is never cached.
        let master_secret = self.secrets.master_secret()?;
        let cookie = self.vault.decrypt_session_cookie(&master_secret)?;

        if !force_refresh {
            if let Some(entry) = self.cache.load() {
                if self.validate(&entry.token, &cookie).await {
                    debug!(captured_at = %entry.ts, "Using cached token");
                    return Ok(self.memoize(entry.token, cookie));
                }
                debug!("Cached token failed validation, rescanning");
            }
        }

        let candidates = self.scanner.scan()?;
        debug!(count = candidates.len(), "Validating scanned candidates");

        for candidate in &candidates {
            if self.validate(&candidate.token, &cookie).await {
                debug!(
                    source = %candidate.source,
                    method = ?candidate.method,
                    "Candidate validated"
                );
                if let Err(e) = self.cache.save(&candidate.token) {
                    warn!(error = %e, "Failed to write token cache");
                }
                return Ok(self.memoize(candidate.token.clone(), cookie));
            }
        }

        // Distinct from the zero-candidate case (NoTokenFound above): here
        // tokens were found but the service rejected them all.
        warn!(
            candidates = candidates.len(),
            "No scanned token validated; returning highest-ranked candidate as-is"
        );
        Ok(self.memoize(candidates[0].token.clone(), cookie))
    }

    /// Drop the memoized pair and re-run the full pipeline.
    pub async fn refresh(&mut self) -> Result<Credentials, AuthError> {
        self.memoized = None;
        self.resolve(true).await
    }

    fn memoize(&mut self, token: String, cookie: String) -> Credentials {
        let creds = Credentials { token, cookie };
        self.memoized = Some(creds.clone());
        creds
    }

    /// Minimal identity check against the live service. Every failure mode
    /// (transport error, timeout, non-2xx, `ok: false`) reads as "invalid";
    /// none aborts resolution.
    async fn validate(&self, token: &str, cookie: &str) -> bool {
        let url = format!("{}/auth.test", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header(header::COOKIE, format!("d={}", cookie))
            .send()
            .await;

        match response {
            Ok(resp) => resp
                .json::<ValidateResponse>()
                .await
                .map(|v| v.ok)
                .unwrap_or(false),
            Err(e) => {
                debug!(error = %e, "Validation request failed");
                false
            }
        }
    }
}
