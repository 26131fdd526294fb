//! The agent capability layer: a uniform interface over external
//! CLI backends, plus the open factory registry that constructs them from an
//! `AgentConfig`.

pub mod amp;
pub mod claude;
pub mod codex;
pub mod copilot;
pub mod cursor;
pub mod factory_cli;
pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod prompt;
pub mod qoder;
pub mod qwen;
pub mod registry;
pub mod runner;
pub mod sanitize;
pub mod stream;

#[cfg(test)]
mod tests;

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

/// Rate-limit defaults an adapter declares for itself; the orchestrator uses
/// these to build the per-agent token bucket on registration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHint {
    /// Tokens (turns) replenished per second.
    pub rate: f64,
    /// Bucket capacity.
    pub burst: u32,
}

impl Default for RateLimitHint {
    fn default() -> Self {
        // One turn every two seconds, bursting up to three — a conservative
        // default suitable for CLI backends without their own published
        // per-agent rate limit overrides.
        Self { rate: 0.5, burst: 3 }
    }
}

/// The capability set every adapter implements. Object-safe so the registry
/// can hand back `Box<dyn Agent>`.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable id, unique within a run (copied from the owning `AgentConfig`).
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// The `type` string this adapter was constructed for, e.g. `"claude"`.
    fn agent_type(&self) -> &str;

    /// Model name, if configured or discovered.
    fn model(&self) -> Option<&str>;

    /// Rate-limit defaults this backend recommends.
    fn rate_limit_hint(&self) -> RateLimitHint {
        RateLimitHint::default()
    }

    /// Completes process-lifecycle setup: locates the backend executable on
    /// `PATH`, stores it, and performs any other one-time setup. Failure is
    /// fatal to the run.
    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError>;

    /// Whether the backend executable is currently resolvable on `PATH`.
    fn is_available(&self) -> bool;

    /// Probes the backend with a short, side-effect-free command.
    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError>;

    /// Sends the full transcript to the backend and returns its reply.
    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError>;

    /// Streaming variant of `send_message`: incremental text is pushed to
    /// `sink` as it arrives; the final accumulated text is also returned.
    async fn stream_message(
        &self,
        deadline: Duration,
        transcript: &[Message],
        sink: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AgentError>;

    /// The join line announced when this agent is added to a conversation.
    fn announce(&self) -> String;
}

/// A zero-arg constructor registered under a `type` string. Boxed so the
/// registry can store heterogeneous factories.
pub type AgentFactory = fn() -> Box<dyn Agent>;
