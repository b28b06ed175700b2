//! Decryption of the Slack session cookie (`d`, value prefix `xoxd-`).
//!
//! Slack stores its cookies in a Chromium-style SQLite database where the
//! value is AES-128-CBC encrypted under a key derived from the Safe Storage
//! secret. Every constant here (salt, iteration count, key size, IV) is
//! dictated by the desktop app; a mismatch yields garbage rather than an
//! error.

use std::path::{Path, PathBuf};

use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use sha1::Sha1;
use tracing::debug;

use super::error::AuthError;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// PBKDF2 salt used by Chromium's Safe Storage on macOS.
const KEY_SALT: &[u8] = b"saltysalt";

/// PBKDF2 iteration count used by Chromium's Safe Storage on macOS.
const KEY_ROUNDS: u32 = 1003;

/// AES-128 key size.
const KEY_LEN: usize = 16;

/// CBC IV: sixteen space bytes.
const IV: [u8; 16] = [0x20; 16];

/// Version tag of the only encryption format currently written by the app.
const VERSION_TAG: &[u8] = b"v10";

/// Cookie row holding the session token.
const COOKIE_NAME: &str = "d";
const COOKIE_HOST: &str = ".slack.com";

/// Prefix of the plaintext session cookie value.
const COOKIE_MARKER: &str = "xoxd-";

/// Extracts and decrypts the session cookie from the app's cookie database.
pub struct CookieVault {
    db_path: PathBuf,
}

impl CookieVault {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Decrypt the current session cookie.
    ///
    /// The database is duplicated to a unique temporary path first — Slack
    /// keeps the original open and SQLite refuses shared access to it. The
    /// copy is removed when this call returns, on success or failure.
    pub fn decrypt_session_cookie(&self, master_secret: &[u8]) -> Result<String, AuthError> {
        let tmp = tempfile::Builder::new()
            .prefix("slk_cookies_")
            .suffix(".db")
            .tempfile()?;
        std::fs::copy(&self.db_path, tmp.path())?;

        let encrypted = read_encrypted_cookie(tmp.path())?;
        debug!(bytes = encrypted.len(), "Read encrypted session cookie");
        decrypt_cookie_value(master_secret, &encrypted)
    }
}

fn read_encrypted_cookie(db: &Path) -> Result<Vec<u8>, AuthError> {
    let conn = Connection::open_with_flags(db, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let value: Option<Vec<u8>> = conn
        .query_row(
            "SELECT encrypted_value FROM cookies WHERE name = ?1 AND host_key = ?2 LIMIT 1",
            (COOKIE_NAME, COOKIE_HOST),
            |row| row.get(0),
        )
        .optional()?;
    value.filter(|v| !v.is_empty()).ok_or(AuthError::CookieNotFound)
}

/// Derive the 16-byte AES key from the keychain secret.
pub(crate) fn derive_key(master_secret: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha1>(master_secret, KEY_SALT, KEY_ROUNDS, &mut key);
    key
}

/// Decrypt a stored `encrypted_value` and return the `xoxd-…` token.
pub(crate) fn decrypt_cookie_value(
    master_secret: &[u8],
    encrypted: &[u8],
) -> Result<String, AuthError> {
    if encrypted.len() < VERSION_TAG.len() || &encrypted[..VERSION_TAG.len()] != VERSION_TAG {
        return Err(AuthError::UnsupportedCookieFormat);
    }

    let key = derive_key(master_secret);
    let decryptor = Aes128CbcDec::new(&key.into(), &IV.into());
    let decrypted = decryptor
        .decrypt_padded_vec_mut::<NoPadding>(&encrypted[VERSION_TAG.len()..])
        .map_err(|_| {
            AuthError::CookieDecryptFailed("ciphertext is not block-aligned".into())
        })?;

    if decrypted.is_empty() {
        return Err(AuthError::CookieDecryptFailed("empty plaintext".into()));
    }

    // PKCS#7, stripped by hand: some builds of the app write unpadded
    // values, which show up as a trailing byte > 16.
    let pad = *decrypted.last().unwrap_or(&0) as usize;
    let unpadded = if pad <= KEY_LEN {
        &decrypted[..decrypted.len() - pad]
    } else {
        &decrypted[..]
    };

    let text = String::from_utf8_lossy(unpadded);
    match text.find(COOKIE_MARKER) {
        Some(idx) => Ok(text[idx..].to_string()),
        None => Err(AuthError::CookieDecryptFailed(
            "no xoxd- marker in decrypted cookie".into(),
        )),
    }
}

/// Builds `v10` records the same way the app does; shared by the cookie
/// and resolver test fixtures.
#[cfg(test)]
pub(crate) mod test_support {
    use cbc::cipher::block_padding::Pkcs7;
    use cbc::cipher::{BlockEncryptMut, KeyIvInit};

    use super::*;

    pub(crate) type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    pub(crate) fn encrypt_record(master_secret: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let key = derive_key(master_secret);
        let encryptor = Aes128CbcEnc::new(&key.into(), &IV.into());
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        let mut record = VERSION_TAG.to_vec();
        record.extend_from_slice(&ciphertext);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{encrypt_record, Aes128CbcEnc};
    use super::*;
    use cbc::cipher::BlockEncryptMut;

    const MASTER_SECRET: &[u8] = b"fixture-master-secret";

    #[test]
    fn test_decrypt_round_trips_to_marker() {
        let record = encrypt_record(MASTER_SECRET, b"xoxd-AbC123%2FsessionValue");
        let cookie = decrypt_cookie_value(MASTER_SECRET, &record).unwrap();
        assert_eq!(cookie, "xoxd-AbC123%2FsessionValue");
    }

    #[test]
    fn test_decrypt_skips_leading_noise() {
        let record = encrypt_record(MASTER_SECRET, b"\x00\x01junkxoxd-value");
        let cookie = decrypt_cookie_value(MASTER_SECRET, &record).unwrap();
        assert!(cookie.starts_with("xoxd-"));
        assert_eq!(cookie, "xoxd-value");
    }

    #[test]
    fn test_unknown_version_tag_rejected() {
        let mut record = encrypt_record(MASTER_SECRET, b"xoxd-value");
        record[0..3].copy_from_slice(b"v11");
        assert!(matches!(
            decrypt_cookie_value(MASTER_SECRET, &record),
            Err(AuthError::UnsupportedCookieFormat)
        ));
    }

    #[test]
    fn test_unpadded_plaintext_kept_whole() {
        // 32 bytes ending in 'z' (0x7a > 16): the pad heuristic must leave
        // the buffer untouched.
        let plaintext = b"xoxd-unpadded-session-valuezzzzz";
        assert_eq!(plaintext.len() % 16, 0);
        let key = derive_key(MASTER_SECRET);
        let encryptor = Aes128CbcEnc::new(&key.into(), &IV.into());
        let ciphertext = encryptor.encrypt_padded_vec_mut::<NoPadding>(plaintext);
        let mut record = VERSION_TAG.to_vec();
        record.extend_from_slice(&ciphertext);

        let cookie = decrypt_cookie_value(MASTER_SECRET, &record).unwrap();
        assert_eq!(cookie.as_bytes(), &plaintext[..]);
    }

    #[test]
    fn test_wrong_secret_fails_without_panic() {
        let record = encrypt_record(MASTER_SECRET, b"xoxd-value");
        // Wrong key produces garbage, which should surface as a decrypt
        // failure (no marker), never a panic.
        let result = decrypt_cookie_value(b"some-other-secret", &record);
        assert!(result.is_err());
    }

    #[test]
    fn test_vault_reads_from_database_copy() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("Cookies");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "CREATE TABLE cookies (name TEXT, host_key TEXT, encrypted_value BLOB)",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO cookies VALUES (?1, ?2, ?3)",
            ("d", ".slack.com", encrypt_record(MASTER_SECRET, b"xoxd-db-value")),
        )
        .unwrap();
        drop(conn);

        let vault = CookieVault::new(db_path);
        let cookie = vault.decrypt_session_cookie(MASTER_SECRET).unwrap();
        assert_eq!(cookie, "xoxd-db-value");
    }

    #[test]
    fn test_missing_cookie_row() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("Cookies");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "CREATE TABLE cookies (name TEXT, host_key TEXT, encrypted_value BLOB)",
            (),
        )
        .unwrap();
        conn.execute(
            "INSERT INTO cookies VALUES (?1, ?2, ?3)",
            ("other", ".slack.com", vec![1u8, 2, 3]),
        )
        .unwrap();
        drop(conn);

        let vault = CookieVault::new(db_path);
        assert!(matches!(
            vault.decrypt_session_cookie(MASTER_SECRET),
            Err(AuthError::CookieNotFound)
        ));
    }
}
