//! Prompt assembly, generalized from `agents/prompt.rs`'s
//! `PromptRequest`/`prepare_prompt` shape.

use crate::config::AgentConfig;
use crate::message::{Message, Role};

/// Builds the default prompt shape: identity line, optional role text,
/// formatted transcript, trailing continuation instruction.
pub fn assemble_default(config: &AgentConfig, transcript: &[Message]) -> String {
    let mut sections = Vec::new();
    sections.push(format!("You are {}, a participant in a multi-agent conversation.", config.name));

    if let Some(role) = &config.prompt {
        sections.push(role.clone());
    }

    if !transcript.is_empty() {
        let history = transcript.iter().map(Message::as_transcript_line).collect::<Vec<_>>().join("\n");
        sections.push(format!("Conversation so far:\n{history}"));
    }

    sections.push(format!(
        "Continue the conversation naturally as {}. Respond with your reply only, no preamble.",
        config.name
    ));

    sections.join("\n\n")
}

/// Groq's structured layout: the conversation's seed task (the `Role::User`
/// message the orchestrator commits before the first turn, if any) is
/// singled out as "YOUR TASK" and kept separate from the remaining history,
/// and the agent's own prior messages are sanitized out before assembly
/// (`sanitize::strip_own_messages`).
pub fn assemble_structured(config: &AgentConfig, transcript: &[Message]) -> String {
    let task = transcript.iter().find(|m| m.role == Role::User).map(|m| m.content.as_str());
    let others: Vec<&Message> = crate::agent::sanitize::strip_own_messages(transcript, &config.id)
        .into_iter()
        .filter(|m| m.role != Role::User)
        .collect();

    let mut sections = Vec::new();
    sections.push(format!("You are {}, a participant in a multi-agent conversation.", config.name));

    if let Some(role) = &config.prompt {
        sections.push(format!("YOUR ROLE:\n{role}"));
    }

    if let Some(task) = task {
        sections.push(format!("YOUR TASK:\n{task}"));
    }

    if !others.is_empty() {
        let history = others.iter().map(|m| m.as_transcript_line()).collect::<Vec<_>>().join("\n");
        sections.push(format!("CONVERSATION HISTORY:\n{history}"));
    }

    sections.push(format!("Respond as {} with your next contribution only.", config.name));
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn default_prompt_includes_identity_role_and_history() {
        let mut config = AgentConfig::new("c1", "claude", "Claude");
        config.prompt = Some("You are terse.".to_string());
        let transcript = vec![Message::agent("g1", "Gemini", "hello")];
        let prompt = assemble_default(&config, &transcript);
        assert!(prompt.contains("You are Claude"));
        assert!(prompt.contains("You are terse."));
        assert!(prompt.contains("Gemini: hello"));
        assert!(prompt.contains("Continue the conversation"));
    }

    #[test]
    fn default_prompt_omits_history_section_when_empty() {
        let config = AgentConfig::new("c1", "claude", "Claude");
        let prompt = assemble_default(&config, &[]);
        assert!(!prompt.contains("Conversation so far"));
    }

    #[test]
    fn structured_prompt_separates_task_from_history_and_strips_own_messages() {
        let config = AgentConfig::new("g1", "groq", "Groq");
        let transcript = vec![
            Message::user("orchestrator", "user", "Plan a trip"),
            Message::agent("g1", "Groq", "my earlier reply"),
            Message::agent("c1", "Claude", "claude's reply"),
        ];
        let prompt = assemble_structured(&config, &transcript);
        assert!(prompt.contains("YOUR TASK:\nPlan a trip"));
        assert!(prompt.contains("Claude: claude's reply"));
        assert!(!prompt.contains("my earlier reply"));
    }
}
