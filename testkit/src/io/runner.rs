//! Command runner abstraction.
//!
//! The [`CommandRunner`] trait decouples stage orchestration from process
//! execution. Tests use a recording runner that returns scripted outcomes
//! without spawning anything.

use crate::core::invocation::Invocation;
use crate::error::CommandError;
use crate::io::process;

/// Runs one invocation to completion.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError>;
}

/// Runner that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), CommandError> {
        process::run(invocation)
    }
}
