//! Claude adapter: stdin-piped invocation, `stream-json` line-delimited
//! streaming, login-gated.

use super::runner::ProcessRunner;
use super::sanitize;
use super::stream::{parse_line, StreamAccumulator};
use super::{prompt, Agent, RateLimitHint};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::message::Message;
use async_trait::async_trait;
use std::time::Duration;

pub struct ClaudeAgent {
    config: Option<AgentConfig>,
    runner: Option<ProcessRunner>,
}

impl ClaudeAgent {
    pub fn new() -> Self {
        Self { config: None, runner: None }
    }

    fn runner(&self) -> Result<&ProcessRunner, AgentError> {
        self.runner.as_ref().ok_or_else(|| AgentError::Initialization("claude agent not initialized".to_string()))
    }

    fn args(&self) -> Vec<&str> {
        let mut args = vec!["--print", "--output-format", "stream-json", "--verbose"];
        if let Some(model) = self.config.as_ref().and_then(|c| c.model.as_deref()) {
            args.push("--model");
            args.push(model);
        }
        args
    }
}

impl Default for ClaudeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for ClaudeAgent {
    fn id(&self) -> &str {
        self.config.as_ref().map(|c| c.id.as_str()).unwrap_or("claude")
    }

    fn name(&self) -> &str {
        self.config.as_ref().map(|c| c.name.as_str()).unwrap_or("Claude")
    }

    fn agent_type(&self) -> &str {
        "claude"
    }

    fn model(&self) -> Option<&str> {
        self.config.as_ref().and_then(|c| c.model.as_deref())
    }

    fn rate_limit_hint(&self) -> RateLimitHint {
        RateLimitHint { rate: 0.2, burst: 2 }
    }

    async fn initialize(&mut self, config: &AgentConfig) -> Result<(), AgentError> {
        self.runner = Some(ProcessRunner::discover(&["claude"])?);
        self.config = Some(config.clone());
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runner.as_ref().map(ProcessRunner::is_available).unwrap_or(false)
    }

    async fn health_check(&self, deadline: Duration) -> Result<(), AgentError> {
        let output = self.runner()?.probe_health(deadline).await?;
        if sanitize::looks_logged_out(&output) {
            return Err(AgentError::Authentication {
                remediation: "run `claude login`, then retry".to_string(),
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
        let config = self.config.as_ref().ok_or_else(|| AgentError::Initialization("claude agent not initialized".to_string()))?;
        let prompt_text = prompt::assemble_default(config, transcript);
        let args = self.args();

        let mut accumulator = StreamAccumulator::new();
        let raw = self
            .runner()?
            .run_streaming_lines(&args, Some(&prompt_text), deadline, |line| {
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
        self.config.as_ref().map(|c| c.announcement_text()).unwrap_or_else(|| "Claude has joined the conversation.".to_string())
    }
}
