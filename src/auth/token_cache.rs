//! On-disk cache for the last validated access token.
//!
//! One JSON record, overwritten wholesale after every successful
//! validation. Lives under this tool's own cache directory, never inside
//! the Slack data directory being scanned.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cache file name in the tool's cache directory.
const CACHE_FILE: &str = "token-cache.json";

/// Directory name under the user cache dir.
const APP_NAME: &str = "slk";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCacheEntry {
    pub token: String,
    /// When the token was captured and validated.
    pub ts: DateTime<Utc>,
}

pub struct TokenCache {
    cache_dir: PathBuf,
}

impl TokenCache {
    /// Cache in the default per-user location.
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?
            .join(APP_NAME);
        Ok(Self { cache_dir })
    }

    /// Cache rooted at an explicit directory (tests).
    pub fn at(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// Load the cached entry. Missing or corrupt cache reads as absent.
    pub fn load(&self) -> Option<TokenCacheEntry> {
        let path = self.cache_path();
        let contents = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "Ignoring corrupt token cache");
                None
            }
        }
    }

    /// Overwrite the cache with a freshly validated token.
    ///
    /// The record is written to a temp file in the same directory and
    /// renamed into place, so a concurrent reader sees the old or the new
    /// entry, never a partial write.
    pub fn save(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let entry = TokenCacheEntry {
            token: token.to_string(),
            ts: Utc::now(),
        };
        let contents = serde_json::to_string(&entry)?;

        let tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        std::fs::write(tmp.path(), contents)?;
        tmp.persist(self.cache_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::at(dir.path().to_path_buf());

        cache.save("xoxc-cached-token").unwrap();
        let entry = cache.load().unwrap();
        assert_eq!(entry.token, "xoxc-cached-token");
    }

    #[test]
    fn test_save_overwrites_whole_record() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::at(dir.path().to_path_buf());

        cache.save("xoxc-first").unwrap();
        let first = cache.load().unwrap();
        cache.save("xoxc-second").unwrap();
        let second = cache.load().unwrap();

        assert_eq!(second.token, "xoxc-second");
        assert!(second.ts >= first.ts);
    }

    #[test]
    fn test_missing_cache_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::at(dir.path().join("never-created"));
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_corrupt_cache_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "{not json").unwrap();
        let cache = TokenCache::at(dir.path().to_path_buf());
        assert!(cache.load().is_none());
    }
}
