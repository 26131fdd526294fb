//! Shared subprocess spawn/timeout/kill skeleton, generalized from
//! `agents/runner.rs` and `ClaudeAgent::execute_streaming_internal`.

use crate::error::AgentError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

/// How long a spawned process is given to exit on its own after its output
/// has been fully consumed, before the runner escalates to a kill.
const PROCESS_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// A minimum output length a health-check probe must produce to count as a
/// successful response rather than a silently-broken binary.
const HEALTH_CHECK_MIN_LEN: usize = 2;

/// Locates a backend executable and runs it under caller-supplied deadlines.
///
/// One `ProcessRunner` is built once per adapter during `initialize` and
/// reused for every turn.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: PathBuf,
}

impl ProcessRunner {
    /// Resolves the first of `candidates` found on `PATH`. `candidates` lets
    /// an adapter accept more than one
    /// executable name (e.g. a vendor rename).
    pub fn discover(candidates: &[&str]) -> Result<Self, AgentError> {
        for name in candidates {
            if let Ok(path) = which::which(name) {
                return Ok(Self { binary: path });
            }
        }
        Err(AgentError::Initialization(format!(
            "none of {candidates:?} found on PATH"
        )))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn is_available(&self) -> bool {
        self.binary.exists() || which::which(&self.binary).is_ok()
    }

    /// Runs a short, side-effect-free probe (`--version`, falling back to
    /// `--help`) and returns its combined output, or a process error if it
    /// produced nothing useful.
    pub async fn probe_health(&self, deadline: Duration) -> Result<String, AgentError> {
        for probe_args in [["--version"].as_slice(), ["--help"].as_slice()] {
            if let Ok(output) = self.run_argument_style(probe_args, deadline).await {
                if output.trim().chars().count() >= HEALTH_CHECK_MIN_LEN {
                    return Ok(output);
                }
            }
        }
        Err(AgentError::Process("health check probe produced no usable output".to_string()))
    }

    /// Spawns the binary with `args`, writes `prompt` to stdin, closes it,
    /// and collects combined stdout/stderr until exit or `deadline`.
    pub async fn run_stdin_piped(&self, args: &[&str], prompt: &str, deadline: Duration) -> Result<String, AgentError> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Process(format!("failed to spawn {}: {e}", self.binary.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        self.collect_output(child, deadline).await
    }

    /// Spawns the binary with `args` (the prompt already embedded as one of
    /// them) and collects combined stdout/stderr until exit or `deadline`.
    pub async fn run_argument_style(&self, args: &[&str], deadline: Duration) -> Result<String, AgentError> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Process(format!("failed to spawn {}: {e}", self.binary.display())))?;

        self.collect_output(child, deadline).await
    }

    /// Spawns the binary with `args`, reads stdout line by line, and calls
    /// `on_line` for each. Used by the line-JSON streaming adapters; plain
    /// text adapters use `run_stdin_piped`/`run_argument_style` instead.
    pub async fn run_streaming_lines(
        &self,
        args: &[&str],
        stdin_payload: Option<&str>,
        deadline: Duration,
        mut on_line: impl FnMut(&str),
    ) -> Result<String, AgentError> {
        let mut command = Command::new(&self.binary);
        command.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        command.stdin(if stdin_payload.is_some() { Stdio::piped() } else { Stdio::null() });

        let mut child = command
            .spawn()
            .map_err(|e| AgentError::Process(format!("failed to spawn {}: {e}", self.binary.display())))?;

        if let Some(payload) = stdin_payload {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(payload.as_bytes()).await;
                let _ = stdin.shutdown().await;
            }
        }

        let stdout = child.stdout.take().expect("stdout was piped");
        let mut reader = BufReader::new(stdout).lines();
        let mut collected = String::new();

        let read_loop = async {
            while let Ok(Some(line)) = reader.next_line().await {
                on_line(&line);
                collected.push_str(&line);
                collected.push('\n');
            }
        };

        if tokio::time::timeout(deadline, read_loop).await.is_err() {
            let _ = child.kill().await;
            return Err(AgentError::Timeout { elapsed: deadline });
        }

        match tokio::time::timeout(PROCESS_WAIT_TIMEOUT, child.wait()).await {
            Ok(_) => Ok(collected),
            Err(_) => {
                let _ = child.kill().await;
                Ok(collected)
            }
        }
    }

    async fn collect_output(&self, mut child: Child, deadline: Duration) -> Result<String, AgentError> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_both = async {
            let mut out = String::new();
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            out
        };

        let output = match tokio::time::timeout(deadline, read_both).await {
            Ok(out) => out,
            Err(_) => {
                let _ = child.kill().await;
                return Err(AgentError::Timeout { elapsed: deadline });
            }
        };

        let status = tokio::time::timeout(PROCESS_WAIT_TIMEOUT, child.wait()).await;
        match status {
            Ok(Ok(status)) if !status.success() && output.trim().is_empty() => {
                Err(AgentError::classify(&format!("process exited with {status}")))
            }
            Ok(Ok(_)) | Ok(Err(_)) => Ok(output),
            Err(_) => {
                let _ = child.kill().await;
                Ok(output)
            }
        }
    }
}
