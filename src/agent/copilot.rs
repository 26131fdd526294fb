//! Copilot adapter: argument/flag invocation, plain-text output,
//! login-gated.

use super::runner::ProcessRunner;
use super::sanitize;
use super::{prompt, Agent};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct CopilotAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl CopilotAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }
}

impl Default for CopilotAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for CopilotAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("copilot")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Copilot")
    }

    fn agent_type(&self) -> &str {
        "copilot"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["copilot"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("copilot agent not initialized".to_string()))?;
        let output = runner.probe_health(deadline).await?;
        if sanitize::looks_logged_out(&output) {
            return Err(AgentError::Authentication {
                remediation: "run `copilot login`, then retry".to_string(),
            });
        }
        Ok(())
    }

    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError> {
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("copilot agent not initialized".to_string()))?;
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("copilot agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);

        let mut args: Vec<&str> = vec!["-p", &prompt_text];
        if let Some(model) = config.model.as_deref() {
            args.push("--model");
            args.push(model);
        }

        let raw = runner.run_argument_style(&args, deadline).await?;
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
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Copilot has joined the conversation.".to_string())
    }
}
