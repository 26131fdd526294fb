//! A thin CLI shell around `agentpipe_core`: argument parsing, config
//! loading, tracing setup, and wiring the orchestrator together. Everything
//! that matters lives in the library; this binary is deliberately small.

use agentpipe_core::RunConfig;
use agentpipe_core::agent::registry;
use agentpipe_core::events::{BridgeEmitter, Emitter, StdoutEmitter};
use agentpipe_core::orchestrator::sink::StdoutSink;
use agentpipe_core::orchestrator::Orchestrator;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agentpipe", about = "Orchestrate a turn-taking conversation between CLI agents")]
struct Cli {
    /// Path to a YAML run configuration.
    #[arg(short, long)]
    config: PathBuf,

    /// Write events as JSON lines to stdout instead of the networked bridge.
    #[arg(long)]
    stdout_events: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let cli = Cli::parse();
    let config = RunConfig::load(&cli.config)?;

    registry::register_default_adapters();

    let conversation_id = uuid::Uuid::new_v4().to_string();
    let emitter: Arc<dyn Emitter> = if cli.stdout_events {
        Arc::new(StdoutEmitter::new())
    } else {
        Arc::new(BridgeEmitter::new(conversation_id.clone(), &config.bridge).await)
    };

    let mut orchestrator = Orchestrator::new(conversation_id, &config.orchestrator, emitter, Box::new(StdoutSink::new()));

    for agent_config in &config.agents {
        let agent = registry::create_agent(agent_config).await?;
        orchestrator.add_agent(agent, agent_config.clone());
    }

    let summary = orchestrator.run().await?;
    tracing::info!(
        status = ?summary.status,
        total_messages = summary.total_messages,
        total_turns = summary.total_turns,
        total_tokens = summary.total_tokens,
        total_cost = summary.total_cost,
        "conversation finished"
    );

    Ok(())
}
