//! Gemini adapter: stdin-piped by default, falling back to an argument
//! invocation for CLI builds that don't read stdin; plain-text output.

use super::runner::ProcessRunner;
use super::sanitize;
use super::{prompt, Agent, RateLimitHint};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct GeminiAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl GeminiAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }
}

impl Default for GeminiAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for GeminiAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("gemini")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Gemini")
    }

    fn agent_type(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["gemini"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("gemini agent not initialized".to_string()))?;
        runner.probe_health(deadline).await.map(|_| ())
    }

    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError> {
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("gemini agent not initialized".to_string()))?;
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("gemini agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);

        // stdin-piped is the primary invocation; a non-interactive gemini
        // build that ignores stdin still answers an argument-passed prompt.
        let raw = match runner.run_stdin_piped(&[], &prompt_text, deadline).await {
            Ok(out) if !sanitize::strip_banners(&out).is_empty() => out,
            _ => runner.run_argument_style(&["-p", &prompt_text], deadline).await?,
        };

        let sanitized = sanitize::strip_banners(&raw);
        if sanitized.is_empty() {
            return Err(AgentError::classify(&raw));
        }
        Ok(sanitized)
    }

    async fn stream_message(
        &self,
        deadline: Duration,
        transcript: &[Message],
        sink: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AgentError> {
        let text = self.send_message(deadline, transcript).await?;
        sink(&text);
        Ok(text)
    }

    fn announce(&self) -> String {
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Gemini has joined the conversation.".to_string())
    }
}
