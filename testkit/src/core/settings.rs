//! Testkit settings (TOML).
//!
//! Paths and timing knobs that stay constant for a container image. Flags that
//! vary per CI job come from the environment instead (see
//! [`RunConfig`](crate::core::run_config::RunConfig)).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Settings file contents. Missing fields fall back to the container defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory the driver is copied to and built in.
    pub driver_repo: PathBuf,

    /// Directory copied into `driver_repo` by the build stage.
    pub source_dir: PathBuf,

    /// `user:group` given ownership of `driver_repo` after the copy.
    pub driver_owner: String,

    /// Directory holding captured backend logs.
    pub artifacts_dir: PathBuf,

    /// Capture backend stdout/stderr to `backendout.log`/`backenderr.log` under
    /// `artifacts_dir`. When false the backend stays attached to the terminal.
    pub capture_backend_logs: bool,

    pub backend: BackendSettings,

    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendSettings {
    /// `host:port` that accepts connections once the backend is serving.
    pub readiness_address: String,

    /// Give up on the backend after this many seconds.
    pub readiness_timeout_secs: u64,

    /// Delay between connection attempts.
    pub readiness_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserSettings {
    pub program: String,
    pub profile: String,
    pub url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            driver_repo: PathBuf::from("/home/driver/repo/"),
            source_dir: PathBuf::from("."),
            driver_owner: "driver:driver".to_string(),
            artifacts_dir: PathBuf::from("/artifacts"),
            capture_backend_logs: true,
            backend: BackendSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            readiness_address: "localhost:8000".to_string(),
            readiness_timeout_secs: 30,
            readiness_interval_ms: 250,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            program: "firefox".to_string(),
            profile: "./profile".to_string(),
            url: "http://localhost:8000".to_string(),
        }
    }
}

impl BackendSettings {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.driver_repo.as_os_str().is_empty() {
            return Err(anyhow!("driver_repo must not be empty"));
        }
        if self.source_dir.as_os_str().is_empty() {
            return Err(anyhow!("source_dir must not be empty"));
        }
        if self.capture_backend_logs && self.artifacts_dir.as_os_str().is_empty() {
            return Err(anyhow!("artifacts_dir must not be empty when capturing logs"));
        }
        if self.driver_owner.trim().is_empty() {
            return Err(anyhow!("driver_owner must not be empty"));
        }
        if self.backend.readiness_address.trim().is_empty() {
            return Err(anyhow!("backend.readiness_address must not be empty"));
        }
        if self.backend.readiness_timeout_secs == 0 {
            return Err(anyhow!("backend.readiness_timeout_secs must be > 0"));
        }
        if self.backend.readiness_interval_ms == 0 {
            return Err(anyhow!("backend.readiness_interval_ms must be > 0"));
        }
        if self.browser.program.trim().is_empty() {
            return Err(anyhow!("browser.program must not be empty"));
        }
        Ok(())
    }
}
