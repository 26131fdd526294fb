//! The turn-taking conversation driver: a single-threaded loop
//! that advances one agent at a time under the configured scheduling mode,
//! retry policy, and rate limits, committing each reply to an append-only
//! transcript and emitting events as it goes.

pub mod limiter;
pub mod modes;
pub mod sink;

use crate::agent::Agent;
use crate::config::{AgentConfig, Mode, OrchestratorConfig, ResolvedRetryConfig};
use crate::events::{ConversationStatus, Emitter, EventData};
use crate::message::{Message, ResponseMetrics};
use crate::metrics::{self, CostEstimator};
use limiter::RateLimiter;
use sink::Sink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One registered conversation participant plus the bookkeeping the driver
/// needs to schedule and rate-limit it.
struct RegisteredAgent {
    agent: Box<dyn Agent>,
    config: AgentConfig,
    limiter: RateLimiter,
}

/// Outcome of a completed `Orchestrator::run` call: exactly one status is
/// reported per run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub status: ConversationStatus,
    pub total_messages: u64,
    pub total_turns: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub duration_seconds: f64,
}

/// The turn-taking driver. Owns the transcript, the registered agents, and
/// the shared cancellation flag.
pub struct Orchestrator {
    conversation_id: String,
    agents: Vec<RegisteredAgent>,
    transcript: Arc<std::sync::RwLock<Vec<Message>>>,
    mode: Mode,
    turn_timeout: Duration,
    max_turns: u32,
    response_delay: Duration,
    retry: ResolvedRetryConfig,
    initial_prompt: Option<String>,
    sink: Box<dyn Sink>,
    emitter: Arc<dyn Emitter>,
    cost_estimator: CostEstimator,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(conversation_id: String, config: &OrchestratorConfig, emitter: Arc<dyn Emitter>, sink: Box<dyn Sink>) -> Self {
        Self {
            conversation_id,
            agents: Vec::new(),
            transcript: Arc::new(std::sync::RwLock::new(Vec::new())),
            mode: config.mode,
            turn_timeout: config.turn_timeout,
            max_turns: config.max_turns,
            response_delay: config.response_delay,
            retry: config.retry.resolved(),
            initial_prompt: config.initial_prompt.clone(),
            sink,
            emitter,
            cost_estimator: CostEstimator::with_default_table(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle callers can use to cancel the run from another task.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Appends `agent`, builds its rate limiter from its declared hint,
    /// writes its announcement to the transcript and sink.
    /// Adding agents mid-conversation is not supported.
    pub fn add_agent(&mut self, agent: Box<dyn Agent>, config: AgentConfig) {
        let hint = agent.rate_limit_hint();
        let announcement = agent.announce();
        let limiter = RateLimiter::new(hint.rate, hint.burst);
        self.agents.push(RegisteredAgent { agent, config: config.clone(), limiter });

        let message = Message::system("orchestrator", "system", announcement);
        self.commit(message.clone());
        self.sink.write_message(&message);
    }

    /// A defensive copy of the transcript so far.
    pub fn get_messages(&self) -> Vec<Message> {
        self.transcript.read().expect("transcript lock poisoned").clone()
    }

    fn commit(&self, message: Message) {
        self.transcript.write().expect("transcript lock poisoned").push(message);
    }

    fn participant_ids(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.config.id.clone()).collect()
    }

    /// Drives the conversation to completion: emits `conversation.started`,
    /// runs the scheduling loop until `max_turns` or cancellation, and
    /// emits exactly one of `conversation.completed`/`conversation.error`
    /// before returning. Fails immediately, without emitting anything, if
    /// no agents are registered.
    pub async fn run(&mut self) -> anyhow::Result<RunSummary> {
        if self.agents.is_empty() {
            anyhow::bail!("no agents configured");
        }

        let start = Instant::now();

        self.emitter
            .emit_conversation_started(EventData::ConversationStarted {
                conversation_id: self.conversation_id.clone(),
                mode: mode_name(self.mode).to_string(),
                initial_prompt: self.initial_prompt.clone(),
                max_turns: if self.max_turns > 0 { Some(self.max_turns) } else { None },
                participants: self.participant_ids(),
                system_info: crate::events::system_info::SystemInfo::capture(),
                command: None,
            })
            .await;

        if let Some(prompt) = self.initial_prompt.clone() {
            let message = Message::user("orchestrator", "user", prompt);
            self.commit(message.clone());
            self.sink.write_message(&message);
        }

        let status = self.drive().await;

        let transcript = self.get_messages();
        let total_turns = transcript.iter().filter(|m| m.metrics.is_some()).count() as u64;
        let total_tokens: u64 = transcript.iter().filter_map(|m| m.metrics.as_ref()).map(ResponseMetrics::total_tokens).sum();
        let total_cost: f64 = transcript.iter().filter_map(|m| m.metrics.as_ref()).map(|m| m.cost).sum();

        let summary = RunSummary {
            status,
            total_messages: transcript.len() as u64,
            total_turns,
            total_tokens,
            total_cost,
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        if status == ConversationStatus::Error {
            self.emitter
                .emit_conversation_error(EventData::ConversationError {
                    conversation_id: self.conversation_id.clone(),
                    error_message: "conversation ended with an unrecovered error".to_string(),
                    error_type: None,
                    agent_type: None,
                })
                .await;
        } else {
            self.emitter
                .emit_conversation_completed(EventData::ConversationCompleted {
                    conversation_id: self.conversation_id.clone(),
                    status: summary.status,
                    total_messages: Some(summary.total_messages),
                    total_turns: Some(summary.total_turns),
                    total_tokens: Some(summary.total_tokens),
                    total_cost: Some(summary.total_cost),
                    duration_seconds: Some(summary.duration_seconds),
                    summary: None,
                })
                .await;
        }

        Ok(summary)
    }

    async fn drive(&mut self) -> ConversationStatus {
        let mut cycle_position: u64 = 0;
        let mut turns_completed: u64 = 0;

        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return ConversationStatus::Interrupted;
            }
            if self.max_turns > 0 && turns_completed >= self.max_turns as u64 {
                let message = Message::system("orchestrator", "system", "Maximum turns reached");
                self.commit(message.clone());
                self.sink.write_message(&message);
                return ConversationStatus::Completed;
            }

            match self.mode {
                Mode::RoundRobin => {
                    let idx = modes::select_round_robin(self.agents.len(), cycle_position);
                    self.take_turn(idx).await;
                    cycle_position += 1;
                    if cycle_position % self.agents.len() as u64 == 0 {
                        turns_completed += 1;
                    }
                }
                Mode::Reactive => {
                    let ids = self.participant_ids();
                    let last_speaker = self.last_agent_speaker();
                    match modes::select_reactive(&ids, last_speaker.as_deref()) {
                        Some(idx) => {
                            if self.take_turn(idx).await {
                                turns_completed += 1;
                            }
                        }
                        None => {
                            tokio::time::sleep(self.response_delay.max(Duration::from_millis(50))).await;
                            continue;
                        }
                    }
                }
                Mode::FreeForm => {
                    let ids = self.participant_ids();
                    let last_speaker = self.last_agent_speaker();
                    let eligible = modes::select_free_form(&ids, last_speaker.as_deref());
                    if eligible.is_empty() {
                        tokio::time::sleep(self.response_delay.max(Duration::from_millis(50))).await;
                        continue;
                    }
                    for idx in eligible {
                        if self.cancel.load(Ordering::SeqCst) {
                            return ConversationStatus::Interrupted;
                        }
                        if self.take_turn(idx).await {
                            turns_completed += 1;
                        }
                        if self.max_turns > 0 && turns_completed >= self.max_turns as u64 {
                            break;
                        }
                    }
                }
            }

            tokio::time::sleep(self.response_delay).await;
        }
    }

    fn last_agent_speaker(&self) -> Option<String> {
        self.transcript
            .read()
            .expect("transcript lock poisoned")
            .iter()
            .rev()
            .find(|m| m.role == crate::message::Role::Agent)
            .map(|m| m.agent_id.clone())
    }

    /// Runs the per-turn protocol for `self.agents[idx]`.
    /// Returns whether the turn produced a reply.
    async fn take_turn(&mut self, idx: usize) -> bool {
        self.agents[idx].limiter.acquire(&self.cancel).await;
        if self.cancel.load(Ordering::SeqCst) {
            return false;
        }

        let transcript_snapshot = self.get_messages();
        let input_tokens =
            metrics::estimate_transcript_tokens(&transcript_snapshot.iter().map(|m| m.content.clone()).collect::<Vec<_>>());

        let total_attempts = self.retry.max_retries + 1;
        let mut last_error: Option<String> = None;
        let mut success: Option<(String, Duration)> = None;

        for attempt in 0..total_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for_attempt(attempt);
                tokio::time::sleep(delay).await;
            }
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }

            let start = Instant::now();
            let result = self.agents[idx].agent.send_message(self.turn_timeout, &transcript_snapshot).await;
            match result {
                Ok(text) => {
                    success = Some((text, start.elapsed()));
                    break;
                }
                Err(err) => {
                    tracing::warn!(agent = self.agents[idx].config.id.as_str(), attempt, error = %err, "turn attempt failed");
                    last_error = Some(err.to_string());
                }
            }
        }

        match success {
            Some((text, elapsed)) => {
                let registered = &self.agents[idx];
                let output_tokens = metrics::estimate_tokens(&text);
                let model = registered.agent.model().map(str::to_string);
                let cost = self.cost_estimator.cost(model.as_deref(), input_tokens, output_tokens);
                let metrics = ResponseMetrics::new(elapsed.as_millis() as u64, input_tokens, output_tokens, model.clone(), cost);

                let message = Message::agent(registered.config.id.clone(), registered.config.name.clone(), text).with_metrics(metrics);
                self.commit(message.clone());
                self.sink.write_message(&message);

                let sequence_number = message_sequence_number(&self.get_messages());
                self.emitter
                    .emit_message_created(EventData::MessageCreated {
                        conversation_id: self.conversation_id.clone(),
                        message_id: uuid::Uuid::new_v4().to_string(),
                        agent_id: registered.config.id.clone(),
                        agent_type: registered.agent.agent_type().to_string(),
                        agent_name: Some(registered.config.name.clone()),
                        content: message.content.clone(),
                        sequence_number: Some(sequence_number),
                        turn_number: None,
                        tokens_used: Some(output_tokens + input_tokens),
                        input_tokens: Some(input_tokens),
                        output_tokens: Some(output_tokens),
                        cost: Some(cost),
                        model,
                        duration_ms: Some(message.metrics.as_ref().map(|m| m.duration_ms).unwrap_or_default()),
                    })
                    .await;

                true
            }
            None => {
                let registered = &self.agents[idx];
                let error_text = last_error.unwrap_or_else(|| "unknown error".to_string());
                tracing::error!(agent = registered.config.id.as_str(), error = %error_text, "turn failed after retries exhausted");

                let message = Message::system("orchestrator", "system", format!("{} failed: {}", registered.config.name, error_text));
                self.commit(message.clone());
                self.sink.write_message(&message);
                false
            }
        }
    }
}

/// The 1-indexed position of the most recently committed agent message
/// among all agent messages: the k-th committed agent message carries
/// sequence number k.
fn message_sequence_number(transcript: &[Message]) -> u64 {
    transcript.iter().filter(|m| m.role == crate::message::Role::Agent).count() as u64
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::RoundRobin => "round-robin",
        Mode::Reactive => "reactive",
        Mode::FreeForm => "free-form",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::RateLimitHint;
    use crate::error::AgentError;
    use crate::events::StdoutEmitter;
    use crate::message::Message as Msg;
    use crate::orchestrator::sink::MemorySink;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    struct EchoAgent {
        id: String,
        name: String,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Agent for EchoAgent {
        fn id(&self) -> &str {
            &self.id
        }
        fn name(&self) -> &str {
            &self.name
        }
        fn agent_type(&self) -> &str {
            "echo"
        }
        fn model(&self) -> Option<&str> {
            None
        }
        fn rate_limit_hint(&self) -> RateLimitHint {
            RateLimitHint { rate: 1000.0, burst: 1000 }
        }
        async fn initialize(&mut self, _config: &AgentConfig) -> Result<(), AgentError> {
            Ok(())
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn health_check(&self, _deadline: Duration) -> Result<(), AgentError> {
            Ok(())
        }
        async fn send_message(&self, _deadline: Duration, _transcript: &[Msg]) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reply #{}", self.calls.load(Ordering::SeqCst)))
        }
        async fn stream_message(
            &self,
            deadline: Duration,
            transcript: &[Msg],
            _sink: &(dyn Fn(&str) + Send + Sync),
        ) -> Result<String, AgentError> {
            self.send_message(deadline, transcript).await
        }
        fn announce(&self) -> String {
            format!("{} has joined the conversation.", self.name)
        }
    }

    fn test_config(id: &str, mode: Mode, max_turns: u32) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new(mode, Duration::from_secs(5));
        config.max_turns = max_turns;
        config.response_delay = Duration::from_millis(1);
        let _ = id;
        config
    }

    #[tokio::test]
    async fn round_robin_cycles_through_agents_and_stops_at_max_turns() {
        let config = test_config("conv", Mode::RoundRobin, 2);
        let mut orchestrator = Orchestrator::new("conv-rr".to_string(), &config, Arc::new(StdoutEmitter::new()), Box::new(MemorySink::new()));

        for name in ["A", "B"] {
            let agent: Box<dyn Agent> = Box::new(EchoAgent { id: name.to_string(), name: name.to_string(), calls: Arc::new(AtomicU32::new(0)) });
            orchestrator.add_agent(agent, AgentConfig::new(name, "echo", name));
        }

        let summary = orchestrator.run().await.unwrap();
        assert_eq!(summary.status, crate::events::ConversationStatus::Completed);
        // max_turns=2 full cycles over 2 agents => 4 agent replies plus 2 announcements plus 1 system stop message.
        assert_eq!(summary.total_turns, 4);
    }

    #[tokio::test]
    async fn cancellation_stops_the_drive_loop() {
        let config = test_config("conv", Mode::RoundRobin, 0);
        let mut orchestrator = Orchestrator::new("conv-cancel".to_string(), &config, Arc::new(StdoutEmitter::new()), Box::new(MemorySink::new()));
        let agent: Box<dyn Agent> = Box::new(EchoAgent { id: "A".to_string(), name: "A".to_string(), calls: Arc::new(AtomicU32::new(0)) });
        orchestrator.add_agent(agent, AgentConfig::new("A", "echo", "A"));

        let cancel = orchestrator.cancel_handle();
        cancel.store(true, Ordering::SeqCst);

        let summary = orchestrator.run().await.unwrap();
        assert_eq!(summary.status, crate::events::ConversationStatus::Interrupted);
    }

    #[tokio::test]
    async fn run_with_no_agents_fails_immediately() {
        let config = test_config("conv", Mode::RoundRobin, 1);
        let mut orchestrator = Orchestrator::new("conv-empty".to_string(), &config, Arc::new(StdoutEmitter::new()), Box::new(MemorySink::new()));

        let err = orchestrator.run().await.unwrap_err();
        assert!(err.to_string().contains("no agents configured"));
    }

    #[tokio::test]
    async fn initial_prompt_is_committed_to_transcript_before_agents_speak() {
        let mut config = test_config("conv", Mode::RoundRobin, 1);
        config.initial_prompt = Some("Plan a trip".to_string());
        let mut orchestrator = Orchestrator::new("conv-seed".to_string(), &config, Arc::new(StdoutEmitter::new()), Box::new(MemorySink::new()));
        let agent: Box<dyn Agent> = Box::new(EchoAgent { id: "A".to_string(), name: "A".to_string(), calls: Arc::new(AtomicU32::new(0)) });
        orchestrator.add_agent(agent, AgentConfig::new("A", "echo", "A"));

        orchestrator.run().await.unwrap();

        let transcript = orchestrator.get_messages();
        let seed = transcript.iter().find(|m| m.role == crate::message::Role::User).expect("seed message committed");
        assert_eq!(seed.content, "Plan a trip");
    }
}
