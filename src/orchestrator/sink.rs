//! The output sink: wherever the orchestrator writes
//! the human-readable transcript as it runs.

use crate::message::Message;
use std::io::Write;
use std::sync::Mutex;

/// Where the orchestrator writes each committed message.
pub trait Sink: Send + Sync {
    fn write_message(&self, message: &Message);
}

/// Writes `Message::as_sink_line()` to stdout under a mutex.
pub struct StdoutSink {
    lock: Mutex<()>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { lock: Mutex::new(()) }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn write_message(&self, message: &Message) {
        let _guard = self.lock.lock().expect("stdout sink mutex poisoned");
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = write!(handle, "{}", message.as_sink_line());
    }
}

/// Collects lines in memory; used by tests and embedders that want the
/// transcript without going through stdout.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("memory sink mutex poisoned").clone()
    }
}

impl Sink for MemorySink {
    fn write_message(&self, message: &Message) {
        self.lines.lock().expect("memory sink mutex poisoned").push(message.as_sink_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn memory_sink_collects_sink_formatted_lines() {
        let sink = MemorySink::new();
        sink.write_message(&Message::agent("a1", "Claude", "hi"));
        assert_eq!(sink.lines(), vec!["[Claude] hi\n".to_string()]);
    }
}
