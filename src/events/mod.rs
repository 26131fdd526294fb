//! Event emission pipeline: typed event payloads, the bridge
//! HTTP client, the local JSONL event store, and two `Emitter`
//! implementations (networked and stdout-only) sharing one send-policy
//! contract.

pub mod bridge;
pub mod client;
pub mod store;
pub mod stdout;
pub mod system_info;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use system_info::SystemInfo;

pub use bridge::BridgeEmitter;
pub use stdout::StdoutEmitter;

/// Formats `now` as RFC3339 with nanosecond precision and a literal `Z`
/// suffix, never `+00:00`.
pub fn rfc3339_nanos_z(now: chrono::DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// The five payload shapes the pipeline emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    ConversationStarted {
        conversation_id: String,
        mode: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial_prompt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_turns: Option<u32>,
        participants: Vec<String>,
        system_info: SystemInfo,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    MessageCreated {
        conversation_id: String,
        message_id: String,
        agent_id: String,
        agent_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_name: Option<String>,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sequence_number: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        turn_number: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tokens_used: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        input_tokens: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        output_tokens: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        cost: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
    },
    ConversationCompleted {
        conversation_id: String,
        status: ConversationStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_messages: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_turns: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_tokens: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_cost: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    ConversationError {
        conversation_id: String,
        error_message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_type: Option<String>,
    },
    BridgeConnected { system_info: SystemInfo, connected_at: String },
}

/// Terminal status recorded on `conversation.completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Completed,
    Interrupted,
    Error,
}

/// The wire/journal envelope: `{ "type": ..., "timestamp": ..., "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: String,
    pub data: EventData,
}

impl Event {
    pub fn new(event_type: &'static str, data: EventData) -> Self {
        Self { event_type: event_type.to_string(), timestamp: rfc3339_nanos_z(Utc::now()), data }
    }
}

/// The interface both bundled emitters implement:
/// four lifecycle hooks, each internally applying its own send-mode policy
/// (sync vs. fire-and-forget).
#[async_trait]
pub trait Emitter: Send + Sync {
    async fn emit_conversation_started(&self, data: EventData);
    async fn emit_message_created(&self, data: EventData);
    async fn emit_conversation_completed(&self, data: EventData);
    async fn emit_conversation_error(&self, data: EventData);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_formatting_uses_literal_z_not_offset() {
        let now = Utc::now();
        let formatted = rfc3339_nanos_z(now);
        assert!(formatted.ends_with('Z'));
        assert!(!formatted.contains("+00:00"));
    }

    #[test]
    fn event_serializes_type_tag_from_data_variant() {
        let event = Event::new(
            "conversation.error",
            EventData::ConversationError {
                conversation_id: "c1".to_string(),
                error_message: "boom".to_string(),
                error_type: None,
                agent_type: None,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"conversation.error\""));
        assert!(json.contains("\"error_message\":\"boom\""));
    }
}
