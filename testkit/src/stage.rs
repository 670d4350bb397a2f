//! Orchestration for the sequential stages (build, unit, integration, stress).
//!
//! Plans come from [`crate::core::plan`]; this module only executes them in
//! order and stops at the first failure.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::invocation::Invocation;
use crate::core::plan::Stage;
use crate::io::runner::CommandRunner;

/// Run every invocation in `plan`, stopping at the first failure.
///
/// Returns the number of invocations that ran. An empty plan means the current
/// configuration has nothing to do for this stage.
#[instrument(skip_all, fields(stage = %stage, steps = plan.len()))]
pub fn run_plan<R: CommandRunner>(stage: Stage, plan: &[Invocation], runner: &R) -> Result<usize> {
    if plan.is_empty() {
        info!("nothing to run for this configuration, skipping stage");
        return Ok(0);
    }
    let total = plan.len();
    for (index, invocation) in plan.iter().enumerate() {
        let step = index + 1;
        info!(step, total, command = %invocation, "running");
        runner
            .run(invocation)
            .with_context(|| format!("{stage} step {step}/{total}"))?;
    }
    info!("stage complete");
    Ok(total)
}
