//! The stdout emitter: a drop-in `Emitter` for CI/CD
//! pipelines that writes events as JSON lines to stdout under a mutex, with
//! no retries and no local store, but identical sequence numbering.

use super::{Emitter, Event, EventData};
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct StdoutEmitter {
    sequence: AtomicU64,
    lock: Mutex<()>,
}

impl StdoutEmitter {
    pub fn new() -> Self {
        Self { sequence: AtomicU64::new(0), lock: Mutex::new(()) }
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn write_line(&self, event: Event) {
        let _guard = self.lock.lock().expect("stdout emitter mutex poisoned");
        if let Ok(line) = serde_json::to_string(&event) {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            let _ = writeln!(handle, "{line}");
        }
    }
}

impl Default for StdoutEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Emitter for StdoutEmitter {
    async fn emit_conversation_started(&self, data: EventData) {
        self.write_line(Event::new("conversation.started", data));
    }

    async fn emit_message_created(&self, data: EventData) {
        self.write_line(Event::new("message.created", data));
    }

    async fn emit_conversation_completed(&self, data: EventData) {
        self.write_line(Event::new("conversation.completed", data));
    }

    async fn emit_conversation_error(&self, data: EventData) {
        self.write_line(Event::new("conversation.error", data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_contiguous_starting_at_one() {
        let emitter = StdoutEmitter::new();
        assert_eq!(emitter.next_sequence(), 1);
        assert_eq!(emitter.next_sequence(), 2);
    }
}
