//! Tolerant recording front-end for observed tool-server traffic.
//!
//! Sits between a message-routing layer and the [`ChatStore`]: classifies
//! inbound bodies by their JSON-RPC envelope and swallows storage failures,
//! because recording must never fail the request it piggybacks on.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::chats::ChatStore;
use crate::types::Direction;

/// Minimal JSON-RPC envelope — only the correlation id matters here.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

/// Classify an inbound body: no correlation id means no reply is expected,
/// so the record is a [`Direction::Notification`]; anything else — including
/// a body that does not parse as a JSON-RPC envelope — is a
/// [`Direction::Request`].
pub fn classify_inbound(payload: &[u8]) -> Direction {
    match serde_json::from_slice::<RpcEnvelope>(payload) {
        Ok(envelope) if envelope.id.is_none() => Direction::Notification,
        _ => Direction::Request,
    }
}

/// Records observed traffic into a shared [`ChatStore`], logging failures
/// at debug level instead of propagating them.
pub struct ChatRecorder {
    store: Arc<ChatStore>,
}

impl ChatRecorder {
    pub fn new(store: Arc<ChatStore>) -> Self {
        ChatRecorder { store }
    }

    /// Record an inbound message, classifying request vs. notification from
    /// its envelope.
    pub fn record_inbound(&self, session_id: &str, toolset: Option<&str>, payload: &[u8]) {
        let direction = classify_inbound(payload);
        if let Err(e) = self
            .store
            .record_message(session_id, toolset, direction, payload)
        {
            debug!("Unable to record chat message for session '{}': {}", session_id, e);
        }
    }

    /// Record an outbound reply.
    pub fn record_response(&self, session_id: &str, toolset: Option<&str>, payload: &[u8]) {
        if let Err(e) =
            self.store
                .record_message(session_id, toolset, Direction::Response, payload)
        {
            debug!("Unable to record chat response for session '{}': {}", session_id, e);
        }
    }
}
