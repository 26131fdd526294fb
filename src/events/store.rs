//! The local JSON-Lines event journal, simplified from
//! `event_store::FileEventStore`: no snapshotting, no aggregate
//! replay, no advisory file locking — just an append-only per-conversation
//! log the emitter writes to before every network attempt.

use crate::events::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only JSONL journal at
/// `{home}/.agentpipe/events/events_{conversation_id}.jsonl`.
///
/// Never blocks event emission on an I/O error: a write failure is logged
/// at debug level and swallowed.
pub struct EventStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl EventStore {
    /// Opens (creating if needed) the journal for `conversation_id` under
    /// the user's home directory.
    pub fn open(conversation_id: &str) -> std::io::Result<Self> {
        let dir = events_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("events_{conversation_id}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// Opens a store rooted at an arbitrary directory, for tests.
    pub fn open_in(dir: &Path, conversation_id: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("events_{conversation_id}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// Appends `event` as one JSON line, flushing immediately. Logs and
    /// swallows I/O errors rather than propagating them.
    pub fn append(&self, event: &Event) {
        let Ok(mut line) = serde_json::to_string(event) else {
            tracing::debug!("failed to serialize event for journal");
            return;
        };
        line.push('\n');

        let mut file = self.file.lock().expect("event store mutex poisoned");
        if let Err(err) = file.write_all(line.as_bytes()).and_then(|_| file.flush()) {
            tracing::debug!(error = %err, path = %self.path.display(), "failed to append event to journal");
        }
    }

    /// Replays every event previously journaled for this conversation, for
    /// later replay or upload.
    pub fn load_events(&self) -> std::io::Result<Vec<Event>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(event) = serde_json::from_str(&line) {
                events.push(event);
            }
        }
        Ok(events)
    }
}

fn events_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".agentpipe").join("events")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventData;

    #[test]
    fn append_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open_in(dir.path(), "conv-1").unwrap();
        let event = Event::new(
            "conversation.error",
            EventData::ConversationError {
                conversation_id: "conv-1".to_string(),
                error_message: "boom".to_string(),
                error_type: None,
                agent_type: None,
            },
        );
        store.append(&event);

        let loaded = store.load_events().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].event_type, "conversation.error");
    }

    #[test]
    fn loading_a_store_with_no_events_yet_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open_in(dir.path(), "conv-empty").unwrap();
        assert!(store.load_events().unwrap().is_empty());
    }
}
