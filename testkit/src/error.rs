//! Typed errors raised at the process and configuration boundaries.
//!
//! Orchestration code wraps these in `anyhow` with context; `main` downcasts to
//! [`CommandError`] to propagate a failing child's exit code.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to run an external command to successful completion.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("`{command}` failed in {} with {}", cwd.display(), describe_code(*code))]
    CommandFailed {
        command: String,
        cwd: PathBuf,
        /// `None` when the child was terminated by a signal.
        code: Option<i32>,
    },

    #[error("working directory does not exist: {}", path.display())]
    InvalidWorkingDirectory { path: PathBuf },

    #[error("open log file {}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("wait for `{command}`")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    /// Exit code of the failed child, if the failure carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// The backend did not become reachable before the browser was due to start.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("resolve readiness address {address}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("readiness address {address} resolved to no socket addresses")]
    NoAddress { address: String },

    #[error("{address} not ready after {attempts} attempts ({elapsed_ms} ms)")]
    Timeout {
        address: String,
        attempts: u32,
        elapsed_ms: u128,
    },

    #[error("server exited with {} before {address} became ready", describe_code(*code))]
    ServerExited { address: String, code: Option<i32> },

    #[error("wait on server during readiness probe")]
    Wait(#[source] CommandError),
}

/// Invalid value for a recognized environment variable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be valid UTF-8")]
    NotUnicode { name: String },

    #[error("{name} must be a non-negative integer number of seconds, got '{value}'")]
    InvalidDuration { name: String, value: String },
}
