//! Real-process tests for the command runner.
//!
//! Child output is captured through log files so assertions can read exactly
//! what the child printed.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use testkit::core::invocation::{Invocation, OutputPolicy};
use testkit::error::CommandError;
use testkit::io::runner::{CommandRunner, SystemRunner};
use testkit::test_support::sh;

/// Run `invocation` with stdout captured, returning the trimmed output.
fn run_captured(invocation: Invocation, dir: &Path) -> String {
    let log = dir.join("stdout.log");
    SystemRunner
        .run(&invocation.output(OutputPolicy::LogFiles {
            stdout: log.clone(),
            stderr: None,
        }))
        .expect("run");
    fs::read_to_string(&log).expect("read log").trim_end().to_string()
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize")
}

#[test]
fn true_succeeds() {
    SystemRunner.run(&Invocation::new("true")).expect("true");
}

#[test]
fn false_fails_with_exit_code_one() {
    let err = SystemRunner.run(&Invocation::new("false")).unwrap_err();
    match err {
        CommandError::CommandFailed { command, code, .. } => {
            assert_eq!(command, "false");
            assert_eq!(code, Some(1));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn failure_records_working_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let err = SystemRunner
        .run(&sh("exit 9").current_dir(temp.path()))
        .unwrap_err();
    match err {
        CommandError::CommandFailed { cwd, code, .. } => {
            assert_eq!(cwd, temp.path());
            assert_eq!(code, Some(9));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn pwd_reports_given_working_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    let printed = run_captured(sh("pwd").current_dir("/tmp"), temp.path());
    assert_eq!(canonical(printed), canonical("/tmp"));
}

#[test]
fn omitted_working_directory_is_callers() {
    let temp = tempfile::tempdir().expect("tempdir");
    let printed = run_captured(sh("pwd"), temp.path());
    let caller = std::env::current_dir().expect("cwd");
    assert_eq!(canonical(printed), canonical(caller));
}

#[test]
fn injected_variable_is_visible() {
    let temp = tempfile::tempdir().expect("tempdir");
    let printed = run_captured(sh("echo $FOO").env("FOO", "bar"), temp.path());
    assert_eq!(printed, "bar");
}

#[test]
fn keys_absent_from_overrides_are_inherited() {
    let temp = tempfile::tempdir().expect("tempdir");
    let printed = run_captured(sh("echo \"$PATH\"").env("FOO", "bar"), temp.path());
    assert_eq!(printed, std::env::var("PATH").expect("PATH"));
}

#[test]
fn override_replaces_inherited_value() {
    let temp = tempfile::tempdir().expect("tempdir");
    let printed = run_captured(sh("echo \"$HOME\"").env("HOME", "/nowhere"), temp.path());
    assert_eq!(printed, "/nowhere");
}

#[test]
fn cleared_environment_only_has_overrides() {
    let temp = tempfile::tempdir().expect("tempdir");
    let invocation = Invocation::new("/bin/sh")
        .args(["-c", "echo \"${PATH:-unset} $FOO\""])
        .env_clear()
        .env("FOO", "only");
    let printed = run_captured(invocation, temp.path());
    assert_eq!(printed, "unset only");
}

#[test]
fn repeated_runs_have_the_same_outcome() {
    let ok = Invocation::new("true");
    let failing = Invocation::new("false");
    for _ in 0..2 {
        SystemRunner.run(&ok).expect("true");
        let err = SystemRunner.run(&failing).unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
    }
}

#[test]
fn unknown_program_is_command_not_found() {
    let err = SystemRunner
        .run(&Invocation::new("testkit-definitely-not-installed"))
        .unwrap_err();
    assert!(matches!(err, CommandError::CommandNotFound { .. }));
}

#[test]
fn missing_working_directory_is_reported_before_spawning() {
    let temp = tempfile::tempdir().expect("tempdir");
    let missing = temp.path().join("not-created");
    let err = SystemRunner
        .run(&Invocation::new("testkit-definitely-not-installed").current_dir(&missing))
        .unwrap_err();
    assert!(matches!(
        err,
        CommandError::InvalidWorkingDirectory { ref path } if *path == missing
    ));
}
