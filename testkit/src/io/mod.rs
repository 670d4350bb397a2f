//! I/O adapters for testkit stages.

pub mod env;
pub mod process;
pub mod readiness;
pub mod runner;
pub mod settings;
