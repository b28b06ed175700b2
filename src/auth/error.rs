use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "Could not find Slack data directory.\nChecked:\n  {}\n  {}\nIs Slack installed?",
        .direct.display(),
        .sandboxed.display()
    )]
    WorkspaceNotFound { direct: PathBuf, sandboxed: PathBuf },

    #[error("Could not find Slack Safe Storage key in Keychain")]
    SecretNotFound,

    #[error("No 'd' cookie found in Slack cookie store")]
    CookieNotFound,

    #[error("Unknown cookie encryption format (expected v10)")]
    UnsupportedCookieFormat,

    #[error("Cookie decryption failed: {0}")]
    CookieDecryptFailed(String),

    #[error("No xoxc- token found in {}. Is Slack running?", .searched.display())]
    NoTokenFound { searched: PathBuf },

    #[error("Cookie database error: {0}")]
    CookieDb(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
