//! Extraction of `xoxc-` access tokens from Slack's LevelDB files.
//!
//! The app caches its session state in an embedded LevelDB under
//! `Local Storage/leveldb`. Tokens show up verbatim in fresh `.log` entries
//! but are often mangled by Snappy block compression once compacted into
//! `.ldb` tables. Two passes cover both cases:
//!
//! - a direct byte-pattern pass for uncompressed entries, and
//! - a structured pass that anchors on the `xoxc-` marker, finds the
//!   64-hex-char tail inside a bounded window, filters out compression
//!   artifacts, and accepts only exact grammar matches.

use std::collections::HashSet;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;

use super::error::AuthError;

/// Minimum plausible token length; anything at or below this is truncated.
const MIN_TOKEN_LEN: usize = 50;

/// Bytes inspected after each `xoxc-` marker in the structured pass.
const SCAN_WINDOW: usize = 200;

/// Characters that can occur in a full `xoxc-` token.
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdef-xoc";

static DIRECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"xoxc-[a-zA-Z0-9_-]{20,}").unwrap());

static HEX_TAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-f0-9]{64}").unwrap());

static FULL_TOKEN_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^xoxc-\d+-\d+-\d+-[a-f0-9]{64}$").unwrap());

/// How a candidate was recovered, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Verbatim byte-pattern match.
    Direct,
    /// Marker + hex-tail reconstruction across compression artifacts.
    Structured,
}

/// A token-shaped string found in a storage file.
#[derive(Debug, Clone)]
pub struct CandidateToken {
    pub token: String,
    pub source: String,
    pub method: ExtractionMethod,
}

/// Scan abstraction, so the resolver's callers can instrument or stub it.
pub trait TokenScan {
    fn scan(&self) -> Result<Vec<CandidateToken>, AuthError>;
}

/// Scans every `.ldb`/`.log` file under the LevelDB directory.
pub struct TokenScanner {
    leveldb_dir: PathBuf,
}

impl TokenScanner {
    pub fn new(leveldb_dir: PathBuf) -> Self {
        Self { leveldb_dir }
    }
}

impl TokenScan for TokenScanner {
    /// Returns candidates longest-first; ties keep discovery order.
    fn scan(&self) -> Result<Vec<CandidateToken>, AuthError> {
        let mut seen = HashSet::new();
        let mut candidates: Vec<CandidateToken> = Vec::new();

        let entries = std::fs::read_dir(&self.leveldb_dir).map_err(|_| {
            AuthError::NoTokenFound {
                searched: self.leveldb_dir.clone(),
            }
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("ldb") | Some("log")
                )
            })
            .collect();
        files.sort();

        for path in &files {
            let data = match std::fs::read(path) {
                Ok(data) => data,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            for token in direct_pass(&data) {
                if seen.insert(token.clone()) {
                    candidates.push(CandidateToken {
                        token,
                        source: source.clone(),
                        method: ExtractionMethod::Direct,
                    });
                }
            }
            for token in structured_pass(&data) {
                if seen.insert(token.clone()) {
                    candidates.push(CandidateToken {
                        token,
                        source: source.clone(),
                        method: ExtractionMethod::Structured,
                    });
                }
            }
        }

        candidates.retain(|c| c.token.len() > MIN_TOKEN_LEN);
        // Stable sort: longer matches are more likely complete, ties keep
        // discovery order.
        candidates.sort_by(|a, b| b.token.len().cmp(&a.token.len()));

        debug!(
            files = files.len(),
            candidates = candidates.len(),
            "LevelDB scan complete"
        );

        if candidates.is_empty() {
            return Err(AuthError::NoTokenFound {
                searched: self.leveldb_dir.clone(),
            });
        }
        Ok(candidates)
    }
}

/// Pass 1: verbatim matches in uncompressed entries.
fn direct_pass(data: &[u8]) -> Vec<String> {
    DIRECT_RE
        .find_iter(data)
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect()
}

/// Pass 2: reconstruct tokens whose surroundings were mangled by block
/// compression. Anchored on `xoxc-`, bounded by [`SCAN_WINDOW`]; only exact
/// grammar matches survive, which also rejects the direct pass's false
/// positives.
fn structured_pass(data: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(offset) = find_subslice(&data[pos..], b"xoxc-") {
        let idx = pos + offset;
        pos = idx + 5;

        let window = &data[idx..data.len().min(idx + SCAN_WINDOW)];
        let Some(tail) = HEX_TAIL_RE.find(window) else {
            continue;
        };

        let raw = &window[..tail.end()];
        let clean: String = raw
            .iter()
            .filter(|b| TOKEN_ALPHABET.contains(b))
            .map(|&b| b as char)
            .collect();

        if FULL_TOKEN_RE.is_match(&clean) {
            tokens.push(clean);
        }
    }
    tokens
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
