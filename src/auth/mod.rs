//! Credential recovery from the Slack desktop app.
//!
//! The desktop app keeps everything needed for a working session on the
//! local machine: its Safe Storage secret in the macOS keychain, an
//! encrypted `xoxd-` session cookie in a SQLite database, and `xoxc-`
//! access tokens in its LevelDB-backed local storage. This module locates
//! those artifacts, decrypts and scans them, validates candidates against
//! the live API, and hands back a usable [`Credentials`] pair:
//!
//! - [`SlackDataDir`]: finds the app's data directory
//! - [`KeychainSecret`]: retrieves the Safe Storage master secret
//! - [`CookieVault`]: decrypts the session cookie
//! - [`TokenScanner`]: extracts token candidates from storage files
//! - [`TokenCache`]: remembers the last validated token
//! - [`CredentialResolver`]: ties the pipeline together

pub mod cookie;
pub mod error;
pub mod resolver;
pub mod scanner;
pub mod secret;
pub mod token_cache;
pub mod workspace;

pub use cookie::CookieVault;
pub use error::AuthError;
pub use resolver::{CredentialResolver, Credentials};
pub use scanner::{CandidateToken, TokenScan, TokenScanner};
pub use secret::{KeychainSecret, SecretSource};
pub use token_cache::{TokenCache, TokenCacheEntry};
pub use workspace::{InstallKind, SlackDataDir};
