//! Run configuration derived once from CI environment variables.
//!
//! The configuration is read at startup and passed explicitly to the planners;
//! nothing downstream consults the process environment for flags.

use std::collections::BTreeMap;

use crate::core::flags::is_enabled;
use crate::error::ConfigError;

/// Recognized environment variable names.
pub mod vars {
    pub const DRIVER_LITE: &str = "TEST_DRIVER_LITE";
    pub const DRIVER_BROWSER: &str = "TEST_DRIVER_BROWSER";
    pub const DRIVER_DENO: &str = "TEST_DRIVER_DENO";
    pub const IN_TEAMCITY: &str = "TEST_IN_TEAMCITY";
    pub const DRIVER_SKIP_BROWSER: &str = "TEST_DRIVER_SKIP_BROWSER";
    pub const SESSION_TYPE: &str = "TEST_SESSION_TYPE";
    pub const STRESS_DURATION: &str = "TEST_NEO4J_STRESS_DURATION";
}

/// Read-only view of environment variables.
///
/// Implemented by [`crate::io::env::ProcessEnv`] for the real environment and by
/// `BTreeMap<String, String>` so tests can inject values without mutating
/// process state.
pub trait EnvSource {
    /// Value of `name`, `Ok(None)` when unset.
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError>;
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(name).cloned())
    }
}

/// Flags selecting which command lines each stage runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Target the reduced-dependency (lite) driver package.
    pub lite: bool,
    /// Run the driver inside a browser instead of node.
    pub browser: bool,
    /// Target the deno build of the driver.
    pub deno: bool,
    /// Running on TeamCity (enables the deno build diff check).
    pub team_city: bool,
    /// Browser target requested, but browser-hosted processes must not start.
    pub skip_browser: bool,
    /// Forwarded to the backend as `SESSION_TYPE`.
    pub session_type: Option<String>,
    /// Forwarded to stress tests as `RUNNING_TIME_IN_SECONDS`.
    pub stress_duration_secs: u64,
}

impl RunConfig {
    pub fn from_env(env: &impl EnvSource) -> Result<Self, ConfigError> {
        let flag = |name: &str| -> Result<bool, ConfigError> {
            Ok(env.var(name)?.is_some_and(|value| is_enabled(&value)))
        };

        let session_type = env
            .var(vars::SESSION_TYPE)?
            .filter(|value| !value.trim().is_empty());

        let stress_duration_secs = match env.var(vars::STRESS_DURATION)? {
            Some(value) if !value.trim().is_empty() => {
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidDuration {
                        name: vars::STRESS_DURATION.to_string(),
                        value: value.clone(),
                    })?
            }
            _ => 0,
        };

        Ok(Self {
            lite: flag(vars::DRIVER_LITE)?,
            browser: flag(vars::DRIVER_BROWSER)?,
            deno: flag(vars::DRIVER_DENO)?,
            team_city: flag(vars::IN_TEAMCITY)?,
            skip_browser: flag(vars::DRIVER_SKIP_BROWSER)?,
            session_type,
            stress_duration_secs,
        })
    }

    /// Whether the backend stage should launch a browser next to the server.
    pub fn launches_browser(&self) -> bool {
        self.browser && !self.skip_browser
    }
}
