//! `--dry-run` rendering of stage plans.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::invocation::Invocation;
use crate::core::plan::{BackendPlan, Stage, backend_plan, sequential_plan};
use crate::core::run_config::RunConfig;
use crate::core::settings::Settings;

#[derive(Serialize)]
struct SequentialView<'a> {
    stage: Stage,
    invocations: &'a [Invocation],
}

#[derive(Serialize)]
struct BackendView<'a> {
    stage: Stage,
    backend: &'a BackendPlan,
}

/// Render the plan for `stage` as text (one invocation per line) or JSON.
pub fn render(
    stage: Stage,
    cfg: &RunConfig,
    settings: &Settings,
    as_json: bool,
) -> Result<String> {
    match sequential_plan(stage, cfg, settings) {
        Some(plan) if as_json => to_json(&SequentialView {
            stage,
            invocations: &plan,
        }),
        Some(plan) => Ok(plan.iter().map(|inv| format!("{inv}\n")).collect()),
        None => {
            let plan = backend_plan(cfg, settings);
            if as_json {
                return to_json(&BackendView {
                    stage,
                    backend: &plan,
                });
            }
            let mut out = format!("server: {}\n", plan.server);
            if let Some(probe) = &plan.readiness {
                out.push_str(&format!(
                    "readiness: {} within {}s\n",
                    probe.address,
                    probe.timeout.as_secs()
                ));
            }
            if let Some(browser) = &plan.browser {
                out.push_str(&format!("browser: {browser}\n"));
            }
            Ok(out)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize plan json")?;
    payload.push('\n');
    Ok(payload)
}
