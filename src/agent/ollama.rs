//! Ollama adapter: stdin-piped invocation, plain-text output.

use super::runner::ProcessRunner;
use super::sanitize;
use super::{prompt, Agent};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct OllamaAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl OllamaAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }
}

impl Default for OllamaAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for OllamaAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("ollama")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Ollama")
    }

    fn agent_type(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["ollama"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("ollama agent not initialized".to_string()))?;
        runner.probe_health(deadline).await.map(|_| ())
    }

    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError> {
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("ollama agent not initialized".to_string()))?;
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("ollama agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);

        let model = config.model.as_deref().unwrap_or("llama3");
        let raw = runner.run_stdin_piped(&["run", model], &prompt_text, deadline).await?;
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
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Ollama has joined the conversation.".to_string())
    }
}
