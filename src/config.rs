//! Declarative configuration consumed by the core.
//!
//! Loading from YAML and environment overrides is the thin shell's job in
//! the general case, but `RunConfig::load` is provided here so the bundled
//! binary (and tests) have a single, validated entry point, mirroring
//! `WorkflowConfig::load`/`validate`'s split.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Declares one conversation participant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Stable handle, unique within a run.
    pub id: String,
    /// Selects the adapter factory, e.g. `"claude"`, `"gemini"`.
    #[serde(rename = "type")]
    pub agent_type: String,
    /// Display name.
    pub name: String,
    /// Role/system instructions.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Join line written to the transcript when the agent is added.
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub custom_settings: HashMap<String, String>,
}

impl AgentConfig {
    pub fn new(id: impl Into<String>, agent_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_type: agent_type.into(),
            name: name.into(),
            prompt: None,
            announcement: None,
            model: None,
            temperature: None,
            max_tokens: None,
            custom_settings: HashMap::new(),
        }
    }

    /// The join line written to the transcript: the configured
    /// `announcement`, or a generic default naming the agent.
    pub fn announcement_text(&self) -> String {
        self.announcement
            .clone()
            .unwrap_or_else(|| format!("{} has joined the conversation.", self.name))
    }
}

/// The three scheduling modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    RoundRobin,
    Reactive,
    FreeForm,
}

/// Retry policy for a single turn.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default, with = "duration_millis_opt")]
    pub retry_initial_delay: Option<Duration>,
    #[serde(default, with = "duration_millis_opt")]
    pub retry_max_delay: Option<Duration>,
    #[serde(default)]
    pub retry_multiplier: f64,
}

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
const DEFAULT_MULTIPLIER: f64 = 2.0;

impl RetryConfig {
    /// Applies the defaulting rule: if all four fields are zero,
    /// substitute the full default tuple; otherwise default only the
    /// individually-zero fields, preserving an explicit `max_retries = 0`.
    pub fn resolved(&self) -> ResolvedRetryConfig {
        let all_zero = self.max_retries == 0
            && self.retry_initial_delay.is_none()
            && self.retry_max_delay.is_none()
            && self.retry_multiplier == 0.0;

        if all_zero {
            return ResolvedRetryConfig {
                max_retries: DEFAULT_MAX_RETRIES,
                initial_delay: DEFAULT_INITIAL_DELAY,
                max_delay: DEFAULT_MAX_DELAY,
                multiplier: DEFAULT_MULTIPLIER,
            };
        }

        ResolvedRetryConfig {
            max_retries: self.max_retries,
            initial_delay: self.retry_initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: self.retry_max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            multiplier: if self.retry_multiplier == 0.0 { DEFAULT_MULTIPLIER } else { self.retry_multiplier },
        }
    }
}

/// A fully-defaulted retry policy, ready for the orchestrator's retry loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl ResolvedRetryConfig {
    /// The backoff delay before attempt `i` (0-indexed; attempt 0 never
    /// sleeps — see orchestrator). `d_i = min(max_delay, initial * mult^i)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = scaled.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

/// Top-level orchestrator behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    pub mode: Mode,
    #[serde(with = "duration_millis")]
    pub turn_timeout: Duration,
    /// 0 = unlimited.
    #[serde(default)]
    pub max_turns: u32,
    #[serde(default, with = "duration_millis")]
    pub response_delay: Duration,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default, flatten)]
    pub retry: RetryConfig,
}

impl OrchestratorConfig {
    pub fn new(mode: Mode, turn_timeout: Duration) -> Self {
        Self {
            mode,
            turn_timeout,
            max_turns: 0,
            response_delay: Duration::ZERO,
            initial_prompt: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Streaming event bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_bridge_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_bridge_timeout_ms() -> u64 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            api_key: None,
            timeout_ms: default_bridge_timeout_ms(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

const DEFAULT_PRODUCTION_URL: &str = "https://bridge.agentpipe.dev";
const DEFAULT_DEVELOPMENT_URL: &str = "http://localhost:8787";

impl BridgeConfig {
    /// Folds `AGENTPIPE_STREAM_{ENABLED,URL,API_KEY}` over a file-loaded
    /// config, and fills a default URL from `AGENTPIPE_ENV` when none is set.
    pub fn from_env_and_file(mut self) -> Self {
        if let Ok(v) = std::env::var("AGENTPIPE_STREAM_ENABLED") {
            self.enabled = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = std::env::var("AGENTPIPE_STREAM_URL") {
            self.url = Some(v);
        }
        if let Ok(v) = std::env::var("AGENTPIPE_STREAM_API_KEY") {
            self.api_key = Some(v);
        }
        if self.url.is_none() {
            let is_dev = std::env::var("AGENTPIPE_ENV")
                .map(|v| v == "development")
                .unwrap_or(false);
            self.url = Some(if is_dev { DEFAULT_DEVELOPMENT_URL } else { DEFAULT_PRODUCTION_URL }.to_string());
        }
        self
    }

    /// Cleans a base URL by stripping a trailing `/` or `/api/ingest` suffix.
    pub fn cleaned_base_url(&self) -> Option<String> {
        self.url.as_ref().map(|url| {
            let trimmed = url.trim_end_matches('/');
            trimmed.strip_suffix("/api/ingest").unwrap_or(trimmed).to_string()
        })
    }
}

/// The validated configuration the core consumes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    pub agents: Vec<AgentConfig>,
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl RunConfig {
    /// Loads and validates a `RunConfig` from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file as YAML: {}", path.display()))?;
        config.bridge = std::mem::take(&mut config.bridge).from_env_and_file();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.agents.is_empty() {
            anyhow::bail!("no agents configured");
        }
        let mut seen = std::collections::HashSet::new();
        for agent in &self.agents {
            if !seen.insert(agent.id.as_str()) {
                anyhow::bail!("duplicate agent id: {}", agent.id);
            }
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_all_zero_applies_full_defaults() {
        let resolved = RetryConfig::default().resolved();
        assert_eq!(resolved.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(resolved.initial_delay, DEFAULT_INITIAL_DELAY);
        assert_eq!(resolved.max_delay, DEFAULT_MAX_DELAY);
        assert_eq!(resolved.multiplier, DEFAULT_MULTIPLIER);
    }

    #[test]
    fn retry_config_preserves_explicit_zero_max_retries() {
        let cfg = RetryConfig {
            max_retries: 0,
            retry_initial_delay: Some(Duration::from_millis(500)),
            retry_max_delay: None,
            retry_multiplier: 1.5,
        };
        let resolved = cfg.resolved();
        assert_eq!(resolved.max_retries, 0);
        assert_eq!(resolved.initial_delay, Duration::from_millis(500));
        assert_eq!(resolved.max_delay, DEFAULT_MAX_DELAY);
        assert_eq!(resolved.multiplier, 1.5);
    }

    #[test]
    fn delay_for_attempt_is_capped_at_max_delay() {
        let resolved = ResolvedRetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        };
        assert_eq!(resolved.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(resolved.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(resolved.delay_for_attempt(10), Duration::from_secs(10));
    }

    #[test]
    fn bridge_cleaned_base_url_strips_trailing_slash_and_ingest_suffix() {
        let mut bridge = BridgeConfig { url: Some("https://example.com/".to_string()), ..Default::default() };
        assert_eq!(bridge.cleaned_base_url().unwrap(), "https://example.com");

        bridge.url = Some("https://example.com/api/ingest".to_string());
        assert_eq!(bridge.cleaned_base_url().unwrap(), "https://example.com");
    }

    #[test]
    fn run_config_rejects_empty_agent_list() {
        let yaml = r#"
agents: []
orchestrator:
  mode: round-robin
  turn_timeout: 5000
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        let result = RunConfig::load(&path);
        assert!(result.is_err());
    }

    #[test]
    fn run_config_rejects_duplicate_agent_ids() {
        let yaml = r#"
agents:
  - id: a
    type: claude
    name: Claude
  - id: a
    type: gemini
    name: Gemini
orchestrator:
  mode: round-robin
  turn_timeout: 5000
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        let result = RunConfig::load(&path);
        assert!(result.is_err());
    }

    #[test]
    fn run_config_loads_valid_yaml() {
        let yaml = r#"
agents:
  - id: a
    type: claude
    name: Claude
  - id: b
    type: gemini
    name: Gemini
orchestrator:
  mode: round-robin
  turn_timeout: 5000
  max_turns: 4
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.orchestrator.max_turns, 4);
        assert_eq!(config.orchestrator.mode, Mode::RoundRobin);
    }
}
