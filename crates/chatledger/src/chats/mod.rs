//! Chat store — append-only JSONL persistence with archive and export.
//!
//! # Disk format
//!
//! One newline-delimited file per session under the store root:
//!
//! ```text
//! <root>/active/<safe_session_id>.jsonl
//! <root>/archived/<safe_session_id>.jsonl
//! ```
//!
//! Each line is one self-contained [`crate::types::Message`] record:
//! `{"sessionId": "...", "direction": "request", "timestamp": "...", "payload": {...}}`
//!
//! Directories are created `0o700` and files `0o600` on Unix — chat content
//! is sensitive.

pub mod store;

pub use store::ChatStore;
