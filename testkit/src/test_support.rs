//! Test-only helpers: injected environments, a recording command runner, and
//! process liveness checks for kill-on-drop tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::invocation::Invocation;
use crate::error::CommandError;
use crate::io::runner::CommandRunner;

/// Build an environment map from `(name, value)` pairs.
pub fn env_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `sh -c <script>` invocation.
pub fn sh(script: &str) -> Invocation {
    Invocation::new("sh").args(["-c", script])
}

/// Shell that starts `sleep 30` in the background, writes `<shell pid>
/// <sleep pid>` to `pid_file`, and waits. The file appears atomically.
pub fn sleep_in_background(pid_file: &Path) -> Invocation {
    sh(&format!(
        "sleep 30 & echo $$ $! > '{0}.tmp' && mv '{0}.tmp' '{0}'; wait",
        pid_file.display()
    ))
}

/// Pids written to `path` by a child, polled until the file appears. Empty if
/// it does not appear within `timeout`.
pub fn read_pids(path: &Path, timeout: Duration) -> Vec<u32> {
    let start = Instant::now();
    loop {
        if let Ok(contents) = fs::read_to_string(path) {
            return contents
                .split_whitespace()
                .filter_map(|pid| pid.parse().ok())
                .collect();
        }
        if start.elapsed() >= timeout {
            return Vec::new();
        }
        thread::sleep(Duration::from_millis(10));
    }
}

/// Whether `pid` is a running process. Zombies count as gone: an orphan killed
/// inside a container may never be reaped.
pub fn process_alive(pid: u32) -> bool {
    let proc_dir = Path::new("/proc");
    if proc_dir.join("self").exists() {
        let Ok(stat) = fs::read_to_string(proc_dir.join(pid.to_string()).join("stat")) else {
            return false;
        };
        // The state letter follows the parenthesised command name.
        return stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .is_some_and(|state| state != 'Z');
    }
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Poll until `pid` is gone. Returns false if it is still alive after `timeout`.
pub fn wait_until_gone(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while process_alive(pid) {
        if start.elapsed() >= timeout {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    true
}

/// Records every invocation it is asked to run. Optionally fails the invocation
/// at a given index with a given exit code.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    seen: RefCell<Vec<Invocation>>,
    fail_at: Option<(usize, i32)>,
}

impl RecordingRunner {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize, exit_code: i32) -> Self {
        Self {
            seen: RefCell::default(),
            fail_at: Some((index, exit_code)),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.seen.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        let index = {
            let mut seen = self.seen.borrow_mut();
            seen.push(invocation.clone());
            seen.len() - 1
        };
        match self.fail_at {
            Some((fail_index, code)) if fail_index == index => Err(CommandError::CommandFailed {
                command: invocation.command_line(),
                cwd: invocation.cwd_or_current().to_path_buf(),
                code: Some(code),
            }),
            _ => Ok(()),
        }
    }
}
