//! The conversation transcript: an append-only sequence of `Message`s.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    System,
    User,
}

/// Per-reply telemetry attached to an agent's `Message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    /// Wall-clock duration of the adapter call, in milliseconds.
    pub duration_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Model name as reported by the adapter, if any.
    pub model: Option<String>,
    /// Cost in USD derived from `model` and token counts against the pricing
    /// table. Zero when the model is unknown to the table.
    pub cost: f64,
}

impl ResponseMetrics {
    pub fn new(
        duration_ms: u64,
        input_tokens: u64,
        output_tokens: u64,
        model: Option<String>,
        cost: f64,
    ) -> Self {
        Self {
            duration_ms,
            input_tokens,
            output_tokens,
            model,
            cost,
        }
    }

    /// `total_tokens = input_tokens + output_tokens`.
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// An immutable record in the transcript.
///
/// Appended by the orchestrator; never mutated or removed once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable handle, unique within a run.
    pub agent_id: String,
    /// Display name.
    pub agent_name: String,
    pub content: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub role: Role,
    pub metrics: Option<ResponseMetrics>,
}

impl Message {
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>, content: impl Into<String>, role: Role) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            content: content.into(),
            timestamp: now_unix(),
            role,
            metrics: None,
        }
    }

    pub fn agent(agent_id: impl Into<String>, agent_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, agent_name, content, Role::Agent)
    }

    pub fn system(agent_id: impl Into<String>, agent_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, agent_name, content, Role::System)
    }

    pub fn user(agent_id: impl Into<String>, agent_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, agent_name, content, Role::User)
    }

    pub fn with_metrics(mut self, metrics: ResponseMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Formats a transcript line in `[HH:MM:SS] speaker: content` form, the
    /// shape every adapter's prompt assembly embeds for prior turns.
    pub fn as_transcript_line(&self) -> String {
        let time = chrono::DateTime::from_timestamp(self.timestamp, 0)
            .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"))
            .format("%H:%M:%S");
        format!("[{}] {}: {}", time, self.agent_name, self.content)
    }

    /// Formats the sink line written by the orchestrator after each turn
    ///: `"[name|{duration_ms}ms|{tokens}t|{cost}] text"`
    /// when metrics exist, else `"[name] text"`.
    pub fn as_sink_line(&self) -> String {
        match &self.metrics {
            Some(m) => format!(
                "[{}|{}ms|{}t|{:.4}] {}\n",
                self.agent_name,
                m.duration_ms,
                m.total_tokens(),
                m.cost,
                self.content
            ),
            None => format!("[{}] {}\n", self.agent_name, self.content),
        }
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_tokens_is_sum_of_input_and_output() {
        let metrics = ResponseMetrics::new(100, 50, 25, Some("claude".into()), 0.01);
        assert_eq!(metrics.total_tokens(), 75);
    }

    #[test]
    fn sink_line_without_metrics_omits_brackets_suffix() {
        let msg = Message::agent("a1", "Claude", "hello there");
        assert_eq!(msg.as_sink_line(), "[Claude] hello there\n");
    }

    #[test]
    fn sink_line_with_metrics_includes_duration_tokens_and_cost() {
        let msg = Message::agent("a1", "Claude", "hello there")
            .with_metrics(ResponseMetrics::new(250, 10, 20, Some("claude-3".into()), 0.0012));
        let line = msg.as_sink_line();
        assert!(line.starts_with("[Claude|250ms|30t|0.0012] hello there"));
    }

    #[test]
    fn transcript_line_formats_speaker_and_content() {
        let mut msg = Message::agent("a1", "Gemini", "ack");
        msg.timestamp = 0;
        assert_eq!(msg.as_transcript_line(), "[00:00:00] Gemini: ack");
    }

    #[test]
    fn system_message_has_system_role() {
        let msg = Message::system("orchestrator", "system", "Maximum turns reached");
        assert_eq!(msg.role, Role::System);
    }
}
