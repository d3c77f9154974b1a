//! Core types for Chatledger — the logged exchange unit, per-session
//! histories, and the consolidated export snapshot.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case. We use
//! `#[serde(rename_all = "camelCase")]` to handle the conversion. Payloads
//! are kept as [`RawValue`] so the stored bytes survive a round trip
//! untouched — the store never interprets them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

// ─────────────────────────────────────────────
// Direction
// ─────────────────────────────────────────────

/// Which side of a client ↔ tool-server exchange a record represents.
///
/// Classification is the caller's job (see [`crate::recorder`]); the store
/// persists whatever it is handed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Inbound call carrying a correlation id.
    Request,
    /// Inbound call without a correlation id — no reply expected.
    Notification,
    /// Outbound reply.
    Response,
}

impl Direction {
    /// Wire value, as written to the log.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Notification => "notification",
            Direction::Response => "response",
        }
    }
}

// ─────────────────────────────────────────────
// Chat status (active / archived)
// ─────────────────────────────────────────────

/// The two mutually exclusive lifecycle states of a session's log.
///
/// Maps to the `active/` and `archived/` subdirectories of the store root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatStatus {
    Active,
    Archived,
}

impl ChatStatus {
    /// Name of the subdirectory holding logs in this state.
    pub fn dir_name(self) -> &'static str {
        match self {
            ChatStatus::Active => "active",
            ChatStatus::Archived => "archived",
        }
    }

    pub fn is_archived(self) -> bool {
        matches!(self, ChatStatus::Archived)
    }
}

// ─────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────

/// One logged exchange unit. Immutable once written — the store only ever
/// appends records, it never rewrites them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque caller-assigned conversation identifier.
    pub session_id: String,
    /// Label of the tool configuration this message belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolset: Option<String>,
    pub direction: Direction,
    /// Assigned by the store at write time, never caller-supplied.
    pub timestamp: DateTime<Utc>,
    /// Serialized body, stored verbatim and never interpreted.
    pub payload: Box<RawValue>,
}

// ─────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────

/// The ordered history of one session — messages in append order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub session_id: String,
    pub archived: bool,
    pub messages: Vec<Message>,
}

// ─────────────────────────────────────────────
// Export
// ─────────────────────────────────────────────

/// A point-in-time snapshot of every chat, active and archived, sorted by
/// session id. Built fresh on each export call and persisted exactly once.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub exported_at: DateTime<Utc>,
    /// Count of active chats, taken before the two corpora are concatenated.
    pub active_chats: usize,
    /// Count of archived chats, taken before concatenation.
    pub archived_chats: usize,
    pub chats: Vec<Chat>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn test_direction_wire_values() {
        assert_eq!(
            serde_json::to_string(&Direction::Request).unwrap(),
            "\"request\""
        );
        assert_eq!(
            serde_json::to_string(&Direction::Notification).unwrap(),
            "\"notification\""
        );
        assert_eq!(
            serde_json::to_string(&Direction::Response).unwrap(),
            "\"response\""
        );
    }

    #[test]
    fn test_direction_as_str_matches_wire_value() {
        for direction in [
            Direction::Request,
            Direction::Notification,
            Direction::Response,
        ] {
            let wire = serde_json::to_string(&direction).unwrap();
            assert_eq!(wire, format!("\"{}\"", direction.as_str()));
        }
    }

    #[test]
    fn test_status_dir_names() {
        assert_eq!(ChatStatus::Active.dir_name(), "active");
        assert_eq!(ChatStatus::Archived.dir_name(), "archived");
        assert!(!ChatStatus::Active.is_archived());
        assert!(ChatStatus::Archived.is_archived());
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message {
            session_id: "sess-1".into(),
            toolset: Some("search".into()),
            direction: Direction::Request,
            timestamp: Utc::now(),
            payload: raw(r#"{"jsonrpc":"2.0","id":1}"#),
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(json["sessionId"], "sess-1");
        assert_eq!(json["toolset"], "search");
        assert_eq!(json["direction"], "request");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["payload"]["jsonrpc"], "2.0");
    }

    #[test]
    fn test_message_omits_absent_toolset() {
        let msg = Message {
            session_id: "sess-1".into(),
            toolset: None,
            direction: Direction::Response,
            timestamp: Utc::now(),
            payload: raw("{}"),
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert!(json.get("toolset").is_none());
    }

    #[test]
    fn test_payload_preserved_verbatim() {
        // Unusual spacing and key order must survive untouched.
        let body = r#"{"b": 1,  "a": {"nested":  true}}"#;
        let msg = Message {
            session_id: "sess-1".into(),
            toolset: None,
            direction: Direction::Notification,
            timestamp: Utc::now(),
            payload: raw(body),
        };

        let line = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&line).unwrap();
        assert_eq!(back.payload.get(), body);
    }

    #[test]
    fn test_message_round_trip() {
        let msg = Message {
            session_id: "sess-42".into(),
            toolset: Some("db".into()),
            direction: Direction::Request,
            timestamp: Utc::now(),
            payload: raw(r#"{"method":"tools/call"}"#),
        };

        let line = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&line).unwrap();
        assert_eq!(back.session_id, msg.session_id);
        assert_eq!(back.toolset, msg.toolset);
        assert_eq!(back.direction, msg.direction);
        assert_eq!(back.timestamp, msg.timestamp);
        assert_eq!(back.payload.get(), msg.payload.get());
    }

    #[test]
    fn test_export_serializes_camel_case() {
        let export = Export {
            exported_at: Utc::now(),
            active_chats: 1,
            archived_chats: 0,
            chats: vec![Chat {
                session_id: "abc".into(),
                archived: false,
                messages: Vec::new(),
            }],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&export).unwrap()).unwrap();
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["activeChats"], 1);
        assert_eq!(json["archivedChats"], 0);
        assert_eq!(json["chats"][0]["sessionId"], "abc");
        assert_eq!(json["chats"][0]["archived"], false);
    }
}
