//! A single planned subprocess invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a child's stdout/stderr go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Child inherits both terminal streams.
    Inherit,
    /// Stdout inherited, stderr redirected into the parent's stdout.
    MergeStderr,
    /// Both streams captured to truncated log files. `stderr: None` merges
    /// stderr into the stdout log.
    LogFiles {
        stdout: PathBuf,
        stderr: Option<PathBuf>,
    },
}

/// Program, arguments, working directory, environment, and output policy for one
/// child process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// `None` runs in the caller's current directory.
    pub cwd: Option<PathBuf>,
    /// Overrides applied on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// When false the child sees only `env`.
    pub inherit_env: bool,
    pub output: OutputPolicy,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            inherit_env: true,
            output: OutputPolicy::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Start the child with an empty environment plus the explicit overrides.
    pub fn env_clear(mut self) -> Self {
        self.inherit_env = false;
        self
    }

    pub fn output(mut self, output: OutputPolicy) -> Self {
        self.output = output;
        self
    }

    /// Working directory as it will be seen by the child, `.` when inherited.
    pub fn cwd_or_current(&self) -> &Path {
        self.cwd.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Shell-like rendering of program and arguments, quoting where needed.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.cwd_or_current().display())?;
        for (key, value) in &self.env {
            write!(f, "{key}={} ", quote(value))?;
        }
        f.write_str(&self.command_line())
    }
}

fn quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
