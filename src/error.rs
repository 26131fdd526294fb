//! Typed error taxonomy for the adapter layer and the event pipeline.
//!
//! Plumbing errors (file I/O, YAML parse, process spawn) stay as
//! `anyhow::Error` at their call sites; these two enums exist where the
//! orchestrator or the bridge client need to match on *kind* rather than
//! just format a message.

use std::time::Duration;
use thiserror::Error;

/// A failure surfaced by an `Agent` invocation.
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    /// The backend binary could not be located or failed to initialize.
    #[error("failed to initialize agent: {0}")]
    Initialization(String),

    /// The backend requires a login the orchestrator cannot perform.
    #[error("authentication required: {remediation}")]
    Authentication { remediation: String },

    /// The subprocess or its stream exceeded its deadline.
    #[error("timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// The configured model is unknown to the backend.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The backend reports an account/subscription problem.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Any other process failure (non-zero exit, no usable output, …).
    #[error("process error: {0}")]
    Process(String),
}

impl AgentError {
    /// Best-effort classification of a backend's raw stdout/stderr text into
    /// a typed error.
    pub fn classify(output: &str) -> Self {
        let lower = output.to_lowercase();
        if lower.contains("not authenticated")
            || lower.contains("not logged in")
            || lower.contains("401")
            || lower.contains("unauthenticated")
        {
            return Self::Authentication {
                remediation: "run the backend CLI's login/auth command, then retry".to_string(),
            };
        }
        if lower.contains("404") || lower.contains("not_found") || lower.contains("model not found") {
            return Self::ModelNotFound(output.trim().to_string());
        }
        if lower.contains("subscription") || lower.contains("quota") || lower.contains("billing") {
            return Self::Subscription(output.trim().to_string());
        }
        Self::Process(output.trim().to_string())
    }
}

/// A failure from the bridge HTTP client. Never propagated to the
/// orchestrator.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A non-2xx HTTP status. 4xx is terminal; 5xx is retried by the caller.
    #[error("bridge returned status {0}")]
    Status(u16),

    #[error("no API key configured")]
    NoApiKey,

    #[error("bridge disabled")]
    Disabled,
}

impl BridgeError {
    /// 4xx is a client-protocol error and must never be retried.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Status(code) if (400..500).contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_authentication_failures() {
        let err = AgentError::classify("Error: not logged in. Run `gh auth login`.");
        assert!(matches!(err, AgentError::Authentication { .. }));
    }

    #[test]
    fn classifies_model_not_found() {
        let err = AgentError::classify("404 model not found: gpt-5-turbo");
        assert!(matches!(err, AgentError::ModelNotFound(_)));
    }

    #[test]
    fn classifies_subscription_errors() {
        let err = AgentError::classify("Your subscription has expired");
        assert!(matches!(err, AgentError::Subscription(_)));
    }

    #[test]
    fn falls_back_to_process_error() {
        let err = AgentError::classify("segmentation fault");
        assert!(matches!(err, AgentError::Process(_)));
    }

    #[test]
    fn status_4xx_is_terminal_5xx_is_not() {
        assert!(BridgeError::Status(404).is_terminal());
        assert!(!BridgeError::Status(502).is_terminal());
    }
}
