//! Process environment access for [`RunConfig`](crate::core::run_config::RunConfig).

use std::ffi::OsString;

use crate::core::run_config::EnvSource;
use crate::error::ConfigError;

/// Reads the real process environment. Non-UTF-8 values fail instead of being
/// silently dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Result<Option<String>, ConfigError> {
        decode(name, std::env::var_os(name))
    }
}

fn decode(name: &str, raw: Option<OsString>) -> Result<Option<String>, ConfigError> {
    raw.map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| ConfigError::NotUnicode {
                name: name.to_string(),
            })
    })
}
