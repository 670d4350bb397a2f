//! Exit codes for the testkit binary.
//!
//! A failing child command propagates its own exit code; these cover the rest.

use crate::error::CommandError;

/// Stage completed.
pub const OK: i32 = 0;
/// Configuration, spawn, readiness, or other non-child failure. Also used when a
/// child was terminated by a signal and has no exit code.
pub const FAILURE: i32 = 1;

/// Exit code for a failed stage: the first failing child's code when the error
/// chain carries one, [`FAILURE`] otherwise.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CommandError>())
        .and_then(CommandError::exit_code)
        .filter(|code| *code != OK)
        .unwrap_or(FAILURE)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Context;

    use super::*;

    fn failed(code: Option<i32>) -> anyhow::Error {
        let err: Result<(), CommandError> = Err(CommandError::CommandFailed {
            command: "npm run test::stress".to_string(),
            cwd: PathBuf::from("/home/driver/repo"),
            code,
        });
        err.context("stress step 1/1").unwrap_err()
    }

    #[test]
    fn propagates_child_exit_code_through_context() {
        assert_eq!(for_error(&failed(Some(42))), 42);
    }

    #[test]
    fn signal_termination_maps_to_failure() {
        assert_eq!(for_error(&failed(None)), FAILURE);
    }

    #[test]
    fn other_errors_map_to_failure() {
        assert_eq!(for_error(&anyhow::anyhow!("bad settings")), FAILURE);
        let not_found = anyhow::Error::new(CommandError::CommandNotFound {
            program: "yarn".to_string(),
        });
        assert_eq!(for_error(&not_found), FAILURE);
    }
}
