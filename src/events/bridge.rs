//! The networked emitter: owns the conversation UUID, the
//! monotonic sequence counter, the `SystemInfo` snapshot, the local
//! `EventStore`, and the `BridgeClient` transport.

use super::client::BridgeClient;
use super::store::EventStore;
use super::system_info::SystemInfo;
use super::{rfc3339_nanos_z, Emitter, Event, EventData};
use crate::config::BridgeConfig;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct BridgeEmitter {
    conversation_id: String,
    sequence: AtomicU64,
    store: Option<Arc<EventStore>>,
    client: Option<Arc<BridgeClient>>,
}

impl BridgeEmitter {
    /// Builds the emitter for `conversation_id`, opens its local journal,
    /// and synchronously emits `bridge.connected`.
    pub async fn new(conversation_id: String, config: &BridgeConfig) -> Self {
        let store = EventStore::open(&conversation_id).ok().map(Arc::new);

        let client = if config.enabled {
            config.cleaned_base_url().map(|base_url| {
                Arc::new(BridgeClient::new(
                    base_url,
                    config.api_key.clone(),
                    std::time::Duration::from_millis(config.timeout_ms),
                    config.retry_attempts,
                ))
            })
        } else {
            None
        };

        let emitter = Self { conversation_id, sequence: AtomicU64::new(0), store, client };

        let connected = Event::new(
            "bridge.connected",
            EventData::BridgeConnected {
                system_info: SystemInfo::capture(),
                connected_at: rfc3339_nanos_z(Utc::now()),
            },
        );
        emitter.dispatch_sync(connected).await;
        emitter
    }

    /// Allocates the next `sequence_number` for a `message.created` event,
    /// assigned in commit order by the orchestrator's driver loop.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    async fn dispatch_sync(&self, event: Event) {
        if let Some(store) = &self.store {
            store.append(&event);
        }
        if let Some(client) = &self.client {
            if let Err(err) = client.send(&event).await {
                tracing::debug!(error = %err, event_type = event.event_type, "bridge send failed");
            }
        }
    }

    fn dispatch_async(&self, event: Event) {
        if let Some(store) = &self.store {
            store.append(&event);
        }
        if let Some(client) = self.client.clone() {
            tokio::spawn(async move {
                if let Err(err) = client.send(&event).await {
                    tracing::debug!(error = %err, event_type = event.event_type, "bridge send failed");
                }
            });
        }
    }
}

#[async_trait]
impl Emitter for BridgeEmitter {
    async fn emit_conversation_started(&self, data: EventData) {
        // Async: must not block the conversation hot path.
        self.dispatch_async(Event::new("conversation.started", data));
    }

    async fn emit_message_created(&self, data: EventData) {
        // Async: high frequency, network must not stall turn-taking.
        self.dispatch_async(Event::new("message.created", data));
    }

    async fn emit_conversation_completed(&self, data: EventData) {
        // Sync: process is about to exit, do not lose it.
        self.dispatch_sync(Event::new("conversation.completed", data)).await;
    }

    async fn emit_conversation_error(&self, data: EventData) {
        // Sync: terminal, do not lose it.
        self.dispatch_sync(Event::new("conversation.error", data)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_numbers_are_contiguous_starting_at_one() {
        let mut config = BridgeConfig::default();
        config.enabled = false;
        let emitter = BridgeEmitter::new("test-conv-seq".to_string(), &config).await;
        assert_eq!(emitter.next_sequence(), 1);
        assert_eq!(emitter.next_sequence(), 2);
        assert_eq!(emitter.next_sequence(), 3);
    }
}
