//! CI orchestration for the driver testkit stages.
//!
//! Every stage (build, unit, integration, stress, backend) is a short sequence of
//! subprocess invocations selected by environment flags. The crate is split so
//! the stage logic stays testable without spawning anything:
//!
//! - **[`core`]**: Pure planning. Flags and settings go in, ordered
//!   [`core::invocation::Invocation`]s come out. No I/O.
//! - **[`io`]**: Side effects (process execution, readiness probing, settings
//!   files, the process environment).
//!
//! [`stage`] and [`backend`] connect the two to implement CLI commands.

pub mod backend;
pub mod core;
pub mod dry_run;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod stage;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
