//! Retrieval of the Slack Safe Storage master secret from the OS keychain.
//!
//! The desktop app stores one generic password under the service
//! `"Slack Safe Storage"`, but the account name has varied across builds.
//! The Mac App Store build writes `"Slack App Store Key"`; direct downloads
//! have used `"Slack Key"` and plain `"Slack"`. All known aliases are tried
//! in an order matching the detected install kind.

use keyring::Entry;
use tracing::debug;

use super::error::AuthError;
use super::workspace::InstallKind;

const SERVICE_NAME: &str = "Slack Safe Storage";

/// Alias order for sandboxed (App Store) installs.
const APPSTORE_ACCOUNTS: [&str; 3] = ["Slack App Store Key", "Slack Key", "Slack"];

/// Alias order for direct-download installs.
const DIRECT_ACCOUNTS: [&str; 3] = ["Slack Key", "Slack", "Slack App Store Key"];

/// Source of the master secret, abstracted so tests can supply a fixed key.
pub trait SecretSource {
    fn master_secret(&self) -> Result<Vec<u8>, AuthError>;
}

/// Keychain-backed secret source.
pub struct KeychainSecret {
    install_kind: InstallKind,
}

impl KeychainSecret {
    pub fn new(install_kind: InstallKind) -> Self {
        Self { install_kind }
    }

    fn accounts(&self) -> &'static [&'static str] {
        match self.install_kind {
            InstallKind::AppStore => &APPSTORE_ACCOUNTS,
            InstallKind::Direct => &DIRECT_ACCOUNTS,
        }
    }
}

impl SecretSource for KeychainSecret {
    /// Try each account alias in turn; only exhaustion of all of them fails.
    /// The returned bytes feed the cookie key derivation and are never
    /// logged or written anywhere.
    fn master_secret(&self) -> Result<Vec<u8>, AuthError> {
        for account in self.accounts() {
            let entry = match Entry::new(SERVICE_NAME, account) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(account, error = %e, "Keychain entry unavailable");
                    continue;
                }
            };
            match entry.get_password() {
                Ok(password) => {
                    debug!(account, "Found Slack Safe Storage key");
                    return Ok(password.into_bytes());
                }
                Err(keyring::Error::NoEntry) => continue,
                Err(e) => {
                    debug!(account, error = %e, "Keychain lookup failed");
                    continue;
                }
            }
        }
        Err(AuthError::SecretNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_order_follows_install_kind() {
        let appstore = KeychainSecret::new(InstallKind::AppStore);
        assert_eq!(appstore.accounts()[0], "Slack App Store Key");

        let direct = KeychainSecret::new(InstallKind::Direct);
        assert_eq!(direct.accounts()[0], "Slack Key");

        // Every alias is tried for either kind
        assert_eq!(appstore.accounts().len(), 3);
        assert_eq!(direct.accounts().len(), 3);
    }
}
