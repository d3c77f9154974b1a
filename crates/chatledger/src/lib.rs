//! Chatledger — durable, per-session append-only chat logging for
//! tool-serving processes.
//!
//! The store persists every observed exchange (requests, notifications,
//! responses) as one JSONL line in a per-session log, survives process
//! restarts, moves finished sessions from `active/` to `archived/` without
//! losing history, and can export a single consolidated snapshot of all
//! sessions for offline inspection.
//!
//! ```no_run
//! use chatledger::{ChatStore, Direction};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = ChatStore::open(chatledger::utils::get_chats_path())?;
//! store.record_message("sess-1", Some("search"), Direction::Request, br#"{"id":1}"#)?;
//! store.archive_session("sess-1")?;
//! store.export_all(&CancellationToken::new(), "chats-export.json")?;
//! # Ok::<(), chatledger::StoreError>(())
//! ```

pub mod chats;
pub mod error;
pub mod recorder;
pub mod types;
pub mod utils;

pub use chats::ChatStore;
pub use error::{StoreError, StoreResult};
pub use recorder::{classify_inbound, ChatRecorder};
pub use types::{Chat, ChatStatus, Direction, Export, Message};
