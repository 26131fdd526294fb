//! Qoder adapter: stdin-piped invocation, plain-text output, login-gated.

use super::runner::ProcessRunner;
use super::sanitize;
use super::{prompt, Agent};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct QoderAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl QoderAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }
}

impl Default for QoderAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for QoderAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("qoder")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Qoder")
    }

    fn agent_type(&self) -> &str {
        "qoder"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["qoder"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("qoder agent not initialized".to_string()))?;
        let output = runner.probe_health(deadline).await?;
        if sanitize::looks_logged_out(&output) {
            return Err(AgentError::Authentication {
                remediation: "run `qoder login`, then retry".to_string(),
            });
        }
        Ok(())
    }

    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError> {
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("qoder agent not initialized".to_string()))?;
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("qoder agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);

        let raw = runner.run_stdin_piped(&[], &prompt_text, deadline).await?;
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
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Qoder has joined the conversation.".to_string())
    }
}
