//! Immutable process/environment snapshot attached to `bridge.connected`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub agentpipe_version: String,
    pub os: String,
    pub os_version: String,
    pub runtime_version: String,
    pub arch: String,
}

impl SystemInfo {
    /// Captures the snapshot once, at emitter construction time.
    pub fn capture() -> Self {
        Self {
            agentpipe_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            os_version: os_version(),
            runtime_version: rustc_runtime_version(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

fn os_version() -> String {
    // No portable stdlib accessor for the kernel/OS release exists; record
    // the target family instead of shelling out to `uname`.
    std::env::consts::FAMILY.to_string()
}

fn rustc_runtime_version() -> String {
    option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown").to_string()
}
