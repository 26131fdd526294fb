//! Line-delimited JSON streaming parse, generalized from
//! `agents::protocol::AgentStreamParser`.

use serde_json::Value;

/// The result of parsing one line from a streaming backend.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental text to append to the accumulated reply and forward to
    /// the caller's sink.
    Delta(String),
    /// A `{"type": "result", "result": ...}` completion marker: short-
    /// circuits further streaming and is preferred over accumulated deltas
    /// when nothing has streamed yet.
    Result(String),
    /// A non-JSON line, or JSON with no recognized text field; passed
    /// through as plain-text delta.
    PlainText(String),
    /// A line that parsed but carried nothing text-bearing (ignored).
    Ignored,
}

/// Parses one line of a Cursor/Amp-style line-JSON stream.
///
/// Known shapes, in order of preference:
/// - `{"type": "result", "result": "..."}`
/// - assistant-message deltas: `{"delta": {"content": "..."}}` or
///   `{"delta": {"text": "..."}}`
/// - fallback top-level fields: `content`, `text`, `message`
/// - non-JSON input passes through verbatim as plain text.
pub fn parse_line(line: &str) -> StreamEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StreamEvent::Ignored;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return StreamEvent::PlainText(trimmed.to_string());
    };

    if value.get("type").and_then(Value::as_str) == Some("result") {
        if let Some(result) = value.get("result").and_then(Value::as_str) {
            return StreamEvent::Result(result.to_string());
        }
    }

    if let Some(delta) = value.get("delta") {
        if let Some(text) = delta.get("content").and_then(Value::as_str) {
            return StreamEvent::Delta(text.to_string());
        }
        if let Some(text) = delta.get("text").and_then(Value::as_str) {
            return StreamEvent::Delta(text.to_string());
        }
    }

    for key in ["content", "text", "message"] {
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            return StreamEvent::Delta(text.to_string());
        }
    }

    StreamEvent::Ignored
}

/// Accumulates the final reply text from a sequence of parsed lines. A
/// `result` marker wins over accumulated deltas only when nothing has
/// streamed yet.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    deltas: String,
    result: Option<String>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one parsed event, returning the delta text to forward to the
    /// caller's sink, if any.
    pub fn feed(&mut self, event: StreamEvent) -> Option<String> {
        match event {
            StreamEvent::Delta(text) | StreamEvent::PlainText(text) => {
                self.deltas.push_str(&text);
                Some(text)
            }
            StreamEvent::Result(text) => {
                self.result = Some(text);
                None
            }
            StreamEvent::Ignored => None,
        }
    }

    /// The final reply: the accumulated deltas, unless nothing streamed and
    /// a `result` marker was seen, in which case that marker wins.
    pub fn finish(self) -> String {
        if self.deltas.trim().is_empty() {
            if let Some(result) = self.result {
                return result;
            }
        }
        self.deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_marker() {
        let event = parse_line(r#"{"type": "result", "result": "done"}"#);
        assert_eq!(event, StreamEvent::Result("done".to_string()));
    }

    #[test]
    fn parses_delta_content() {
        let event = parse_line(r#"{"delta": {"content": "hi"}}"#);
        assert_eq!(event, StreamEvent::Delta("hi".to_string()));
    }

    #[test]
    fn parses_delta_text_fallback() {
        let event = parse_line(r#"{"delta": {"text": "hi"}}"#);
        assert_eq!(event, StreamEvent::Delta("hi".to_string()));
    }

    #[test]
    fn falls_back_to_top_level_content_field() {
        let event = parse_line(r#"{"content": "plain"}"#);
        assert_eq!(event, StreamEvent::Delta("plain".to_string()));
    }

    #[test]
    fn non_json_line_passes_through_as_plain_text() {
        let event = parse_line("just some text");
        assert_eq!(event, StreamEvent::PlainText("just some text".to_string()));
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_line("   "), StreamEvent::Ignored);
    }

    #[test]
    fn accumulator_prefers_deltas_over_result_when_deltas_present() {
        let mut acc = StreamAccumulator::new();
        acc.feed(StreamEvent::Delta("hello ".to_string()));
        acc.feed(StreamEvent::Delta("world".to_string()));
        acc.feed(StreamEvent::Result("ignored".to_string()));
        assert_eq!(acc.finish(), "hello world");
    }

    #[test]
    fn accumulator_falls_back_to_result_when_nothing_streamed() {
        let mut acc = StreamAccumulator::new();
        acc.feed(StreamEvent::Result("final answer".to_string()));
        assert_eq!(acc.finish(), "final answer");
    }
}
