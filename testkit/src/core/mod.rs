//! Pure planning logic: configuration flags, invocation types, and stage plans.
//!
//! Nothing in this module touches the filesystem, the environment, or processes.

pub mod flags;
pub mod invocation;
pub mod plan;
pub mod run_config;
pub mod settings;
