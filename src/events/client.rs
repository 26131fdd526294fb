//! The bridge HTTP client, modeled on `open-agent-sdk-rust`'s `retry.rs`
//! shape, but with a fixed `1s, 2s, 4s, …` backoff schedule instead of
//! jittered delays, since callers need exact attempt counts to stay
//! predictable.

use crate::error::BridgeError;
use crate::events::Event;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Thin wrapper over `reqwest` posting one event per call to
/// `{base_url}/api/ingest`.
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry_attempts: u32,
    warned: AtomicBool,
}

impl BridgeClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration, retry_attempts: u32) -> Self {
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { http, base_url, api_key, retry_attempts, warned: AtomicBool::new(false) }
    }

    /// Sends `event`, retrying 5xx/network failures with exponential
    /// backoff `1s, 2s, 4s, …` up to `retry_attempts`. A 4xx
    /// response is terminal. Returns `NoApiKey` without attempting a send
    /// if no key is configured.
    pub async fn send(&self, event: &Event) -> Result<(), BridgeError> {
        let Some(api_key) = self.api_key.as_ref().filter(|k| !k.is_empty()) else {
            return Err(BridgeError::NoApiKey);
        };

        let url = format!("{}/api/ingest", self.base_url);
        let mut attempt = 0u32;

        loop {
            let result = self
                .http
                .post(&url)
                .bearer_auth(api_key)
                .json(event)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let err = BridgeError::Status(status);
                    if err.is_terminal() || attempt >= self.retry_attempts {
                        self.warn_once();
                        return Err(err);
                    }
                }
                Err(network_err) => {
                    if attempt >= self.retry_attempts {
                        self.warn_once();
                        return Err(BridgeError::Network(network_err));
                    }
                }
            }

            let delay = Duration::from_secs(1u64 << attempt.min(6));
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Prints a single user-visible warning on the first permanent failure
    /// and suppresses further warnings for the process's lifetime.
    fn warn_once(&self) {
        if self.warned.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            tracing::warn!("bridge event delivery failed permanently; suppressing further bridge warnings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventData;

    fn sample_event() -> Event {
        Event::new(
            "conversation.error",
            EventData::ConversationError {
                conversation_id: "c1".to_string(),
                error_message: "boom".to_string(),
                error_type: None,
                agent_type: None,
            },
        )
    }

    #[tokio::test]
    async fn missing_api_key_is_a_noop_error_without_network_attempt() {
        let client = BridgeClient::new("http://127.0.0.1:1".to_string(), None, Duration::from_secs(1), 3);
        let err = client.send(&sample_event()).await.unwrap_err();
        assert!(matches!(err, BridgeError::NoApiKey));
    }

    #[tokio::test]
    async fn empty_api_key_string_is_treated_as_absent() {
        let client = BridgeClient::new("http://127.0.0.1:1".to_string(), Some(String::new()), Duration::from_secs(1), 3);
        let err = client.send(&sample_event()).await.unwrap_err();
        assert!(matches!(err, BridgeError::NoApiKey));
    }
}
