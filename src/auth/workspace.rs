//! Locates the Slack desktop app's private data directory.
//!
//! Slack can be installed two ways on macOS and each keeps its data in a
//! different place: a direct download uses `~/Library/Application Support/
//! Slack`, while the Mac App Store build is sandboxed under
//! `~/Library/Containers`. The install kind also determines which keychain
//! account name holds the Safe Storage key.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use super::error::AuthError;

/// Sandbox container id of the Mac App Store build.
const APPSTORE_CONTAINER: &str = "com.tinyspeck.slackmacgap";

/// Resolved directory, shared for the lifetime of the process.
/// The directory cannot move while Slack is running, so one lookup is enough.
static LOCATED: OnceCell<PathBuf> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallKind {
    /// Direct download from slack.com
    Direct,
    /// Mac App Store (sandboxed)
    AppStore,
}

/// Handle to the Slack data directory and the artifact paths inside it.
#[derive(Debug, Clone)]
pub struct SlackDataDir {
    root: PathBuf,
}

impl SlackDataDir {
    /// Find the data directory among the known install layouts.
    ///
    /// The result is memoized process-wide; later calls return the first
    /// resolution without touching the filesystem.
    pub fn locate() -> Result<Self, AuthError> {
        let root = LOCATED.get_or_try_init(|| {
            let [direct, sandboxed] = Self::candidates();
            if direct.exists() {
                Ok(direct)
            } else if sandboxed.exists() {
                Ok(sandboxed)
            } else {
                Err(AuthError::WorkspaceNotFound { direct, sandboxed })
            }
        })?;
        Ok(Self { root: root.clone() })
    }

    /// Use an explicit directory instead of probing the known layouts.
    /// Used for the `slack_dir` config override and for test fixtures.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn candidates() -> [PathBuf; 2] {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        [
            home.join("Library/Application Support/Slack"),
            home.join("Library/Containers")
                .join(APPSTORE_CONTAINER)
                .join("Data/Library/Application Support/Slack"),
        ]
    }

    pub fn install_kind(&self) -> InstallKind {
        if self
            .root
            .components()
            .any(|c| c.as_os_str() == APPSTORE_CONTAINER)
        {
            InstallKind::AppStore
        } else {
            InstallKind::Direct
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the LevelDB log/table files scanned for tokens.
    pub fn leveldb_dir(&self) -> PathBuf {
        self.root.join("Local Storage").join("leveldb")
    }

    /// The app's cookie database (SQLite, usually locked while Slack runs).
    pub fn cookies_db(&self) -> PathBuf {
        self.root.join("Cookies")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_kind_direct() {
        let dir = SlackDataDir::at("/Users/x/Library/Application Support/Slack");
        assert_eq!(dir.install_kind(), InstallKind::Direct);
    }

    #[test]
    fn test_install_kind_appstore() {
        let dir = SlackDataDir::at(
            "/Users/x/Library/Containers/com.tinyspeck.slackmacgap/Data/Library/Application Support/Slack",
        );
        assert_eq!(dir.install_kind(), InstallKind::AppStore);
    }

    #[test]
    fn test_derived_paths() {
        let dir = SlackDataDir::at("/tmp/slack");
        assert_eq!(
            dir.leveldb_dir(),
            PathBuf::from("/tmp/slack/Local Storage/leveldb")
        );
        assert_eq!(dir.cookies_db(), PathBuf::from("/tmp/slack/Cookies"));
    }
}
