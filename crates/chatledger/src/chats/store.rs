//! The [`ChatStore`] — durable per-session append-only logs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::types::{Chat, ChatStatus, Direction, Export, Message};
use crate::utils::safe_session_id;

// ─────────────────────────────────────────────
// ChatStore
// ─────────────────────────────────────────────

/// Append-only, per-session chat log store.
///
/// A store is either *enabled* — rooted at a directory holding `active/` and
/// `archived/` log trees — or *disabled*, in which case every mutating
/// operation is a documented no-op and only [`ChatStore::export_all`]
/// reports an error. All mutations are serialized through one store-wide
/// lock: appends and archives are short, bounded, blocking file operations.
pub struct ChatStore {
    inner: Option<StoreInner>,
}

struct StoreInner {
    root: PathBuf,
    lock: Mutex<()>,
}

impl ChatStore {
    /// Open a store rooted at `root`, creating the `active/` and `archived/`
    /// directories (mode `0o700` on Unix) if they do not exist.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();

        let active = root.join(ChatStatus::Active.dir_name());
        create_private_dir(&active)
            .map_err(|e| StoreError::io("create chat storage directory", &active, e))?;
        let archived = root.join(ChatStatus::Archived.dir_name());
        create_private_dir(&archived)
            .map_err(|e| StoreError::io("create chat archive directory", &archived, e))?;

        Ok(ChatStore {
            inner: Some(StoreInner {
                root,
                lock: Mutex::new(()),
            }),
        })
    }

    /// A store with no backing directory. Recording and archiving are
    /// no-ops; exporting fails with [`StoreError::NotConfigured`].
    pub fn disabled() -> Self {
        ChatStore { inner: None }
    }

    /// Build a store from an optional configured root. `None` or a blank
    /// string yields the disabled store.
    pub fn from_root(root: Option<&str>) -> StoreResult<Self> {
        match root.map(str::trim) {
            Some(root) if !root.is_empty() => Self::open(root),
            _ => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Append one message to the session's active log, creating the log and
    /// its directories as needed.
    ///
    /// The timestamp is assigned here, at write time. `payload` must be a
    /// valid JSON document; it is stored verbatim and never interpreted.
    /// The record is flushed before this returns.
    pub fn record_message(
        &self,
        session_id: &str,
        toolset: Option<&str>,
        direction: Direction,
        payload: &[u8],
    ) -> StoreResult<()> {
        let Some(inner) = &self.inner else {
            debug!(
                "Chat storage disabled, dropping message for session '{}'",
                session_id
            );
            return Ok(());
        };
        if session_id.is_empty() {
            return Err(StoreError::MissingSessionId);
        }

        let payload = std::str::from_utf8(payload)?;
        let payload =
            RawValue::from_string(payload.to_owned()).map_err(StoreError::PayloadNotJson)?;

        let message = Message {
            session_id: session_id.to_string(),
            toolset: toolset.map(str::to_owned),
            direction,
            timestamp: Utc::now(),
            payload,
        };

        let mut record = serde_json::to_string(&message).map_err(StoreError::Encode)?;
        record.push('\n');

        let _guard = inner.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = inner.session_path(session_id, ChatStatus::Active);
        if let Some(parent) = path.parent() {
            create_private_dir(parent)
                .map_err(|e| StoreError::io("create chat storage directory", parent, e))?;
        }

        let mut file = open_private_append(&path)
            .map_err(|e| StoreError::io("open chat session file", &path, e))?;
        // One write per record: a line is never torn across writers.
        file.write_all(record.as_bytes())
            .map_err(|e| StoreError::io("write chat message to", &path, e))?;
        file.flush()
            .map_err(|e| StoreError::io("flush chat message to", &path, e))?;

        debug!(
            "Recorded {} message for session '{}'",
            direction.as_str(),
            session_id
        );
        Ok(())
    }

    /// Move a session's log from active to archived status.
    ///
    /// Idempotent: archiving a session with no active log succeeds as a
    /// no-op, as does an empty `session_id` (lifecycle calls are tolerant).
    /// When an archived log already exists, the active records are appended
    /// after it — chronological order is preserved across repeated archive
    /// cycles — and the active file is removed only once the append has
    /// fully succeeded.
    pub fn archive_session(&self, session_id: &str) -> StoreResult<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        if session_id.is_empty() {
            return Ok(());
        }

        let _guard = inner.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let source = inner.session_path(session_id, ChatStatus::Active);
        let dest = inner.session_path(session_id, ChatStatus::Archived);

        match fs::metadata(&source) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::io("stat chat session file", &source, e)),
            Ok(_) => {}
        }

        if let Some(parent) = dest.parent() {
            create_private_dir(parent)
                .map_err(|e| StoreError::io("create chat archive directory", parent, e))?;
        }

        match fs::metadata(&dest) {
            Ok(_) => {
                append_log(&dest, &source)?;
                fs::remove_file(&source)
                    .map_err(|e| StoreError::io("remove chat session file", &source, e))?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::rename(&source, &dest)
                    .map_err(|e| StoreError::io("archive chat session file", &source, e))?;
            }
            Err(e) => return Err(StoreError::io("stat chat archive file", &dest, e)),
        }

        debug!("Archived chat session '{}'", session_id);
        Ok(())
    }

    /// Load every chat under the given status.
    ///
    /// A missing status directory (or a disabled store) yields an empty
    /// corpus. A record that fails to parse fails the whole load. The
    /// `cancel` token is checked between files; once triggered the load
    /// stops promptly with [`StoreError::Cancelled`].
    pub fn load_chats(
        &self,
        cancel: &CancellationToken,
        status: ChatStatus,
    ) -> StoreResult<Vec<Chat>> {
        let Some(inner) = &self.inner else {
            return Ok(Vec::new());
        };

        let dir = inner.root.join(status.dir_name());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io("read chat directory", &dir, e)),
        };

        let mut chats = Vec::new();
        for entry in entries {
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            let entry = entry.map_err(|e| StoreError::io("read chat directory", &dir, e))?;
            let path = entry.path();
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || path.extension().map_or(true, |ext| ext != "jsonl") {
                continue;
            }
            let Some(session_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let messages = read_messages(&path)?;
            chats.push(Chat {
                session_id: session_id.to_string(),
                archived: status.is_archived(),
                messages,
            });
        }
        Ok(chats)
    }

    /// Write one consolidated snapshot of all chats — active and archived,
    /// sorted by session id — to `output_path` as pretty-printed JSON.
    ///
    /// The mutation lock is deliberately not held across the two load
    /// passes: a concurrent record or archive may interleave, so the
    /// snapshot is a best-effort view, not a strictly consistent one.
    pub fn export_all(
        &self,
        cancel: &CancellationToken,
        output_path: impl AsRef<Path>,
    ) -> StoreResult<()> {
        let output_path = output_path.as_ref();
        if self.inner.is_none() {
            return Err(StoreError::NotConfigured);
        }
        if output_path.to_string_lossy().trim().is_empty() {
            return Err(StoreError::MissingOutputPath);
        }

        let active = self.load_chats(cancel, ChatStatus::Active)?;
        let archived = self.load_chats(cancel, ChatStatus::Archived)?;

        let mut export = Export {
            exported_at: Utc::now(),
            active_chats: active.len(),
            archived_chats: archived.len(),
            chats: active.into_iter().chain(archived).collect(),
        };
        // Stable sort: a tie keeps the active-loaded entry ahead.
        export.chats.sort_by(|a, b| a.session_id.cmp(&b.session_id));

        let data = serde_json::to_string_pretty(&export).map_err(StoreError::Encode)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                create_private_dir(parent)
                    .map_err(|e| StoreError::io("create export directory", parent, e))?;
            }
        }

        // Sibling temp file, then rename into place.
        let mut tmp = output_path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp_path = PathBuf::from(tmp);
        write_private(&tmp_path, data.as_bytes())
            .map_err(|e| StoreError::io("write export file", &tmp_path, e))?;
        fs::rename(&tmp_path, output_path)
            .map_err(|e| StoreError::io("rename export file to", output_path, e))?;

        debug!(
            "Exported {} chats ({} active, {} archived) to {}",
            export.chats.len(),
            export.active_chats,
            export.archived_chats,
            output_path.display()
        );
        Ok(())
    }
}

impl StoreInner {
    /// Location of a session's log under the given status.
    fn session_path(&self, session_id: &str, status: ChatStatus) -> PathBuf {
        self.root
            .join(status.dir_name())
            .join(format!("{}.jsonl", safe_session_id(session_id)))
    }
}

// ─────────────────────────────────────────────
// File helpers
// ─────────────────────────────────────────────

/// Append every byte of `source` to the end of `dest`, flushed. `source` is
/// left untouched — callers remove it only after this returns `Ok`.
fn append_log(dest: &Path, source: &Path) -> StoreResult<()> {
    let data =
        fs::read(source).map_err(|e| StoreError::io("read chat session file", source, e))?;
    let mut file = open_private_append(dest)
        .map_err(|e| StoreError::io("open chat archive file", dest, e))?;
    file.write_all(&data)
        .map_err(|e| StoreError::io("append to chat archive file", dest, e))?;
    file.flush()
        .map_err(|e| StoreError::io("flush chat archive file", dest, e))?;
    Ok(())
}

/// Parse every line of a session log as one [`Message`] record.
fn read_messages(path: &Path) -> StoreResult<Vec<Message>> {
    let file = File::open(path).map_err(|e| StoreError::io("open chat session file", path, e))?;
    let reader = BufReader::new(file);

    let mut messages = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| StoreError::io("read chat session file", path, e))?;
        let message = serde_json::from_str(&line).map_err(|e| StoreError::MalformedRecord {
            path: path.to_path_buf(),
            line: index + 1,
            source: e,
        })?;
        messages.push(message);
    }
    Ok(messages)
}

fn create_private_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

fn open_private_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
