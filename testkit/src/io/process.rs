//! Helpers for running child processes described by an [`Invocation`].
//!
//! Log files and child handles are owned values: log file descriptors are moved
//! into the [`Command`] and closed when it is dropped. Every child is the leader
//! of its own process group, and an un-joined [`RunningProcess`] kills the whole
//! group and reaps the leader on drop, so wrapper processes (`npm run ...`) do
//! not leave their grandchildren behind.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Duration;

use command_group::{CommandGroup, GroupChild};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::invocation::{Invocation, OutputPolicy};
use crate::error::CommandError;

/// Run an invocation to completion.
///
/// Fails with [`CommandError::CommandFailed`] when the child exits non-zero or is
/// killed by a signal.
#[instrument(skip_all, fields(program = %invocation.program))]
pub fn run(invocation: &Invocation) -> Result<(), CommandError> {
    spawn(invocation)?.wait()
}

/// Start an invocation in a new process group without waiting for it.
#[instrument(skip_all, fields(program = %invocation.program))]
pub fn spawn(invocation: &Invocation) -> Result<RunningProcess, CommandError> {
    let mut cmd = build_command(invocation)?;

    debug!(cwd = %invocation.cwd_or_current().display(), "spawning child process");
    let group = match cmd.group_spawn() {
        Ok(group) => group,
        Err(e) => {
            error!(err = %e, command = %invocation.command_line(), "failed to spawn command");
            return Err(spawn_error(invocation, e));
        }
    };
    // Drops the parent's copies of any log file handles.
    drop(cmd);

    Ok(RunningProcess {
        group: Some(group),
        command: invocation.command_line(),
        cwd: resolved_cwd(invocation),
    })
}

/// Handle to a started process group. Join it with [`RunningProcess::wait`];
/// dropping it un-joined kills every process in the group.
pub struct RunningProcess {
    group: Option<GroupChild>,
    command: String,
    cwd: PathBuf,
}

impl fmt::Debug for RunningProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningProcess")
            .field("pid", &self.id())
            .field("command", &self.command)
            .field("cwd", &self.cwd)
            .finish()
    }
}

impl RunningProcess {
    /// Pid of the group leader, which is also the process group id.
    pub fn id(&self) -> Option<u32> {
        self.group.as_ref().map(|group| group.id())
    }

    /// Wait up to `timeout` for the group leader to exit. `Ok(None)` if still
    /// running.
    pub fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ExitStatus>, CommandError> {
        let Some(group) = self.group.as_mut() else {
            return Ok(None);
        };
        group
            .inner()
            .wait_timeout(timeout)
            .map_err(|source| CommandError::Wait {
                command: self.command.clone(),
                source,
            })
    }

    /// Block until the group leader exits, failing on a non-zero status.
    #[instrument(skip_all, fields(command = %self.command))]
    pub fn wait(mut self) -> Result<(), CommandError> {
        let Some(mut group) = self.group.take() else {
            return Ok(());
        };
        // The leader is waited on directly: a status already collected by
        // `wait_timeout` is cached on the std handle.
        let status = group.inner().wait().map_err(|source| CommandError::Wait {
            command: self.command.clone(),
            source,
        })?;
        debug!(exit_code = ?status.code(), "command finished");
        self.check(status)
    }

    fn check(&self, status: ExitStatus) -> Result<(), CommandError> {
        if status.success() {
            return Ok(());
        }
        warn!(exit_code = ?status.code(), command = %self.command, "command failed");
        Err(CommandError::CommandFailed {
            command: self.command.clone(),
            cwd: self.cwd.clone(),
            code: status.code(),
        })
    }
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        let Some(mut group) = self.group.take() else {
            return;
        };
        // Killed even when the leader already exited: its children may still
        // hold the group open.
        warn!(command = %self.command, "killing un-joined process group");
        if let Err(e) = group.kill() {
            debug!(err = %e, "process group already gone");
        }
        if let Err(e) = group.inner().wait() {
            warn!(err = %e, "failed to reap child process");
        }
    }
}

fn build_command(invocation: &Invocation) -> Result<Command, CommandError> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args);

    if let Some(dir) = &invocation.cwd {
        // Checked up front: spawning into a missing directory also reports
        // NotFound, which would be misread as a missing program.
        if !dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory { path: dir.clone() });
        }
        cmd.current_dir(dir);
    }

    if !invocation.inherit_env {
        cmd.env_clear();
    }
    cmd.envs(&invocation.env);

    match &invocation.output {
        OutputPolicy::Inherit => {}
        OutputPolicy::MergeStderr => {
            cmd.stderr(io::stdout());
        }
        OutputPolicy::LogFiles { stdout, stderr } => {
            let out = create_log(stdout)?;
            let err = match stderr {
                Some(path) => create_log(path)?,
                None => out.try_clone().map_err(|source| CommandError::LogFile {
                    path: stdout.clone(),
                    source,
                })?,
            };
            cmd.stdout(out).stderr(err);
        }
    }

    Ok(cmd)
}

/// Create (or truncate) a log file, creating missing parent directories.
fn create_log(path: &Path) -> Result<File, CommandError> {
    let log_error = |source: io::Error| CommandError::LogFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(log_error)?;
    }
    File::create(path).map_err(log_error)
}

fn spawn_error(invocation: &Invocation, source: io::Error) -> CommandError {
    if source.kind() == io::ErrorKind::NotFound {
        CommandError::CommandNotFound {
            program: invocation.program.clone(),
        }
    } else {
        CommandError::Spawn {
            command: invocation.command_line(),
            source,
        }
    }
}

fn resolved_cwd(invocation: &Invocation) -> PathBuf {
    match &invocation.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_support::{process_alive, read_pids, sh, sleep_in_background, wait_until_gone};

    #[test]
    fn zero_exit_succeeds() {
        run(&Invocation::new("true")).expect("true succeeds");
    }

    #[test]
    fn non_zero_exit_carries_code() {
        let err = run(&sh("exit 7")).unwrap_err();
        assert_eq!(err.exit_code(), Some(7));
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = run(&Invocation::new("testkit-no-such-program")).unwrap_err();
        assert!(matches!(
            err,
            CommandError::CommandNotFound { ref program } if program == "testkit-no-such-program"
        ));
    }

    #[test]
    fn missing_cwd_is_invalid_working_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing");
        let err = run(&Invocation::new("true").current_dir(&missing)).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidWorkingDirectory { ref path } if *path == missing
        ));
    }

    #[test]
    fn log_files_capture_both_streams_separately() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("logs/out.log");
        let err = temp.path().join("logs/err.log");
        run(&sh("echo to-out; echo to-err 1>&2").output(OutputPolicy::LogFiles {
            stdout: out.clone(),
            stderr: Some(err.clone()),
        }))
        .expect("run");

        assert_eq!(fs::read_to_string(&out).expect("out"), "to-out\n");
        assert_eq!(fs::read_to_string(&err).expect("err"), "to-err\n");
    }

    #[test]
    fn merged_log_file_collects_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("combined.log");
        run(&sh("echo one; echo two 1>&2").output(OutputPolicy::LogFiles {
            stdout: out.clone(),
            stderr: None,
        }))
        .expect("run");

        assert_eq!(fs::read_to_string(&out).expect("out"), "one\ntwo\n");
    }

    #[test]
    fn log_files_are_truncated_and_written_on_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("out.log");
        fs::write(&out, "stale contents from a previous run\n").expect("seed");

        let err = run(&sh("echo fresh; exit 2").output(OutputPolicy::LogFiles {
            stdout: out.clone(),
            stderr: None,
        }))
        .unwrap_err();

        assert_eq!(err.exit_code(), Some(2));
        assert_eq!(fs::read_to_string(&out).expect("out"), "fresh\n");
    }

    #[test]
    fn dropping_unjoined_process_kills_its_group() {
        let temp = tempfile::tempdir().expect("tempdir");
        let pid_file = temp.path().join("pids");
        let mut process = spawn(&sleep_in_background(&pid_file)).expect("spawn");
        assert_eq!(process.wait_timeout(Duration::from_millis(10)).expect("poll"), None);

        let pids = read_pids(&pid_file, Duration::from_secs(5));
        assert_eq!(pids.len(), 2, "{pids:?}");
        assert_eq!(Some(pids[0]), process.id());
        drop(process);

        for pid in pids {
            assert!(wait_until_gone(pid, Duration::from_secs(5)), "pid {pid} still alive");
        }
    }

    #[test]
    fn dropping_after_leader_exit_kills_leftover_children() {
        let temp = tempfile::tempdir().expect("tempdir");
        let pid_file = temp.path().join("pids");
        let script = format!(
            "sleep 30 & echo $! > '{0}.tmp' && mv '{0}.tmp' '{0}'; exit 0",
            pid_file.display()
        );
        let mut process = spawn(&sh(&script)).expect("spawn");
        let status = process
            .wait_timeout(Duration::from_secs(5))
            .expect("poll")
            .expect("leader exited");
        assert!(status.success());

        let pids = read_pids(&pid_file, Duration::from_secs(5));
        assert_eq!(pids.len(), 1, "{pids:?}");
        assert!(process_alive(pids[0]));
        drop(process);

        assert!(wait_until_gone(pids[0], Duration::from_secs(5)));
    }

    #[test]
    fn wait_timeout_reports_exit() {
        let mut process = spawn(&sh("exit 0")).expect("spawn");
        let status = process
            .wait_timeout(Duration::from_secs(5))
            .expect("poll")
            .expect("exited");
        assert!(status.success());
        process.wait().expect("join after exit");
    }
}
