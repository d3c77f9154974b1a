//! Utility helpers — default storage paths and session-id sanitization.

use std::path::PathBuf;

/// Get the Chatledger data directory (e.g. `~/.chatledger/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".chatledger")
}

/// Get the default chat store root (e.g. `~/.chatledger/chats/`).
pub fn get_chats_path() -> PathBuf {
    get_data_path().join("chats")
}

/// Map a raw session identifier to a filesystem-safe token.
///
/// Keeps ASCII letters, digits, `-`, `_` and `.`; every other character —
/// path separators, whitespace, non-ASCII — becomes `_`. Total and
/// deterministic: the same input always yields the same token, and no input
/// can fail. Distinct identifiers may sanitize to the same token and will
/// then share one log file.
pub fn safe_session_id(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
