//! Core of agentpipe: a turn-taking orchestrator for multi-agent CLI
//! conversations.
//!
//! This crate implements the three subsystems that make up the orchestration
//! core — the agent adapter layer, the conversation orchestrator, and the
//! event emission pipeline — and nothing else. CLI parsing, YAML config
//! loading, TUI rendering, and metrics exposition are the responsibility of
//! a thin shell around this library (see `src/bin/agentpipe.rs` for a
//! minimal example of such a shell).

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod metrics;
pub mod orchestrator;

pub use agent::{Agent, AgentFactory};
pub use config::{AgentConfig, OrchestratorConfig, RunConfig};
pub use error::{AgentError, BridgeError};
pub use events::{BridgeEmitter, Emitter, Event, EventData, StdoutEmitter};
pub use message::{Message, ResponseMetrics, Role};
pub use orchestrator::Orchestrator;
