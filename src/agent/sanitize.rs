//! Output sanitization: stripping banner
//! noise a CLI prints before its real reply, and detecting "not logged in"
//! substrings during health checks.

use crate::message::Message;

/// Banner-line prefixes that precede a CLI's real output and must not be
/// treated as part of the reply.
const BANNER_PREFIXES: &[&str] = &[
    "Loaded cached credentials",
    "To authenticate",
    "Checking for updates",
    "Welcome to",
];

/// Substrings that indicate a login-gated backend is not currently
/// authenticated, surfaced by a `status`/`--help` probe.
const NOT_LOGGED_IN_SUBSTRINGS: &[&str] = &[
    "not logged in",
    "not authenticated",
    "please log in",
    "please sign in",
    "run `login`",
    "authentication required",
];

/// Removes banner lines from raw subprocess output, returning only the
/// lines that look like genuine reply content.
pub fn strip_banners(raw: &str) -> String {
    raw.lines()
        .filter(|line| !BANNER_PREFIXES.iter().any(|prefix| line.trim_start().starts_with(prefix)))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Whether `probe_output` contains a known "not logged in" signal.
pub fn looks_logged_out(probe_output: &str) -> bool {
    let lower = probe_output.to_lowercase();
    NOT_LOGGED_IN_SUBSTRINGS.iter().any(|needle| lower.contains(needle))
}

/// Filters an agent's own prior messages out of a transcript before it is
/// shown back to that same agent, as Groq's structured prompt requires.
pub fn strip_own_messages<'a>(transcript: &'a [Message], agent_id: &str) -> Vec<&'a Message> {
    transcript.iter().filter(|m| m.agent_id != agent_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_banner_lines() {
        let raw = "Loaded cached credentials\nTo authenticate, visit...\nHere is my actual reply.";
        assert_eq!(strip_banners(raw), "Here is my actual reply.");
    }

    #[test]
    fn leaves_output_without_banners_untouched() {
        let raw = "Just a normal reply.";
        assert_eq!(strip_banners(raw), "Just a normal reply.");
    }

    #[test]
    fn detects_not_logged_in_case_insensitively() {
        assert!(looks_logged_out("Error: Not Logged In. Run `cursor login`."));
        assert!(!looks_logged_out("Version 1.2.3"));
    }

    #[test]
    fn strip_own_messages_excludes_matching_agent_id() {
        let transcript = vec![Message::agent("a", "A", "mine"), Message::agent("b", "B", "theirs")];
        let filtered = strip_own_messages(&transcript, "a");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].agent_id, "b");
    }
}
