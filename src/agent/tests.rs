//! Cross-adapter invariants: every bundled adapter must report a stable
//! `agent_type()` and a sensible default `name()`/`id()` before
//! `initialize` is ever called, since the registry constructs first and
//! initializes second.

use super::*;

fn all_default_agents() -> Vec<Box<dyn Agent>> {
    vec![
        Box::new(claude::ClaudeAgent::new()),
        Box::new(gemini::GeminiAgent::new()),
        Box::new(codex::CodexAgent::new()),
        Box::new(copilot::CopilotAgent::new()),
        Box::new(cursor::CursorAgent::new()),
        Box::new(amp::AmpAgent::new()),
        Box::new(groq::GroqAgent::new()),
        Box::new(qwen::QwenAgent::new()),
        Box::new(ollama::OllamaAgent::new()),
        Box::new(factory_cli::FactoryAgent::new()),
        Box::new(qoder::QoderAgent::new()),
    ]
}

#[test]
fn every_bundled_adapter_has_a_distinct_type_string() {
    let agents = all_default_agents();
    let mut seen = std::collections::HashSet::new();
    for agent in &agents {
        assert!(seen.insert(agent.agent_type().to_string()), "duplicate agent_type: {}", agent.agent_type());
    }
    assert_eq!(agents.len(), 11);
}

#[test]
fn every_bundled_adapter_is_unavailable_before_initialize() {
    for agent in all_default_agents() {
        assert!(!agent.is_available(), "{} reported available before initialize", agent.agent_type());
    }
}

#[test]
fn every_bundled_adapter_has_nonempty_default_name() {
    for agent in all_default_agents() {
        assert!(!agent.name().is_empty());
        assert!(!agent.id().is_empty());
    }
}

#[test]
fn default_rate_limit_hint_is_positive() {
    let hint = RateLimitHint::default();
    assert!(hint.rate > 0.0);
    assert!(hint.burst > 0);
}
