//! The process-wide adapter factory registry: an open set so new backends
//! can be added without touching a closed dispatch enum.

use super::{Agent, AgentFactory};
use crate::config::AgentConfig;
use crate::error::AgentError;
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

static REGISTRY: OnceLock<RwLock<HashMap<&'static str, AgentFactory>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<&'static str, AgentFactory>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers `factory` under `type_name`. Idempotent: re-registering the
/// same name overwrites the previous factory, so tests and callers can
/// substitute a fake adapter.
pub fn register(type_name: &'static str, factory: AgentFactory) {
    registry().write().expect("agent registry lock poisoned").insert(type_name, factory);
}

/// Registers every adapter bundled with this crate.
/// Call once at process startup before any `create_agent` call.
pub fn register_default_adapters() {
    register("claude", || Box::new(super::claude::ClaudeAgent::new()));
    register("gemini", || Box::new(super::gemini::GeminiAgent::new()));
    register("codex", || Box::new(super::codex::CodexAgent::new()));
    register("copilot", || Box::new(super::copilot::CopilotAgent::new()));
    register("cursor", || Box::new(super::cursor::CursorAgent::new()));
    register("amp", || Box::new(super::amp::AmpAgent::new()));
    register("groq", || Box::new(super::groq::GroqAgent::new()));
    register("qwen", || Box::new(super::qwen::QwenAgent::new()));
    register("ollama", || Box::new(super::ollama::OllamaAgent::new()));
    register("factory", || Box::new(super::factory_cli::FactoryAgent::new()));
    register("qoder", || Box::new(super::qoder::QoderAgent::new()));
}

/// Looks up the factory for `config.agent_type`, constructs an instance,
/// and initializes it. Errors: `unknown agent type`,
/// or any error propagated from the adapter's `initialize`.
pub async fn create_agent(config: &AgentConfig) -> Result<Box<dyn Agent>, AgentError> {
    let factory = {
        let registry = registry().read().expect("agent registry lock poisoned");
        *registry
            .get(config.agent_type.as_str())
            .ok_or_else(|| AgentError::Initialization(format!("unknown agent type: {}", config.agent_type)))?
    };

    let mut agent = factory();
    agent.initialize(config).await?;
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RateLimitHint;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubAgent {
        id: String,
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn id(&self) -> &str {
            &self.id
        }
        fn name(&self) -> &str {
            "Stub"
        }
        fn agent_type(&self) -> &str {
            "stub-for-tests"
        }
        fn model(&self) -> Option<&str> {
            None
        }
        fn rate_limit_hint(&self) -> RateLimitHint {
            RateLimitHint::default()
        }
        async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
            self.id = config.id.clone();
            Ok(())
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn health_check(&self, _deadline: Duration) -> Result<(), AgentError> {
            Ok(())
        }
        async fn send_message(&self, _deadline: Duration, _transcript: &[crate::message::Message]) -> Result<String, AgentError> {
            Ok("stub reply".to_string())
        }
        async fn stream_message(
            &self,
            _deadline: Duration,
            _transcript: &[crate::message::Message],
            _sink: &(dyn Fn(&str) + Send + Sync),
        ) -> Result<String, AgentError> {
            Ok("stub reply".to_string())
        }
        fn announce(&self) -> String {
            "Stub has joined the conversation.".to_string()
        }
    }

    #[tokio::test]
    async fn unknown_type_is_an_initialization_error() {
        let config = AgentConfig::new("x", "does-not-exist", "X");
        let err = create_agent(&config).await.unwrap_err();
        assert!(matches!(err, AgentError::Initialization(_)));
    }

    #[tokio::test]
    async fn registered_factory_constructs_and_initializes() {
        register("stub-for-tests", || Box::new(StubAgent { id: String::new() }));
        let config = AgentConfig::new("s1", "stub-for-tests", "Stub");
        let agent = create_agent(&config).await.unwrap();
        assert_eq!(agent.id(), "s1");
    }
}
