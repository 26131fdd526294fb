//! Cursor adapter: argument/flag invocation with `--stream-json`, line-JSON
//! pull-loop streaming, login-gated.

use super::runner::ProcessRunner;
use super::sanitize;
use super::stream::{parse_line, StreamAccumulator};
use super::{prompt, Agent};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct CursorAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl CursorAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }
}

impl Default for CursorAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for CursorAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("cursor")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Cursor")
    }

    fn agent_type(&self) -> &str {
        "cursor"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["cursor-agent", "cursor"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("cursor agent not initialized".to_string()))?;
        let output = runner.probe_health(deadline).await?;
        if sanitize::looks_logged_out(&output) {
            return Err(AgentError::Authentication {
                remediation: "run `cursor-agent login`, then retry".to_string(),
            });
        }
        Ok(())
    }

    async fn send_message(&self, deadline: Duration, transcript: &[Message]) -> Result<String, AgentError> {
        self.stream_message(deadline, transcript, &|_| {}).await
    }

    async fn stream_message(
        &self,
        deadline: Duration,
        transcript: &[Message],
        sink: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AgentError> {
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("cursor agent not initialized".to_string()))?;
        let runner = self.runner.as_ref().ok_or_else(|| AgentError::Initialization("cursor agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);

        let mut args: Vec<&str> = vec!["-p", &prompt_text, "--stream-json"];
        if let Some(model) = config.model.as_deref() {
            args.push("--model");
            args.push(model);
        }

        let mut accumulator = StreamAccumulator::new();
        let raw = runner
            .run_streaming_lines(&args, None, deadline, |line| {
                if let Some(delta) = accumulator.feed(parse_line(line)) {
                    sink(&delta);
                }
            })
            .await?;

        let text = accumulator.finish();
        if text.trim().is_empty() {
            let sanitized = sanitize::strip_banners(&raw);
            if sanitized.is_empty() {
                return Err(AgentError::classify(&raw));
            }
            return Ok(sanitized);
        }
        Ok(text)
    }

    fn announce(&self) -> String {
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Cursor has joined the conversation.".to_string())
    }
}
