//! Stage planners: flags and settings in, ordered invocations out.
//!
//! Each function here is the whole decision logic of one CI stage. Execution
//! lives in [`crate::stage`] and [`crate::backend`].

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::core::invocation::{Invocation, OutputPolicy};
use crate::core::run_config::RunConfig;
use crate::core::settings::Settings;

const FULL_PACKAGE: &str = "neo4j-driver";
const LITE_PACKAGE: &str = "neo4j-driver-lite";
const DENO_LIB: &str = "packages/neo4j-driver-deno/lib/";
const DENO_LIB_CHECK: &str = "packages/neo4j-driver-deno/lib2/";

pub const BACKEND_STDOUT_LOG: &str = "backendout.log";
pub const BACKEND_STDERR_LOG: &str = "backenderr.log";

/// CI stage selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Copy the driver into the repo directory, install, and build.
    Build,
    /// Unit tests.
    Unit,
    /// Integration tests against a running database.
    Integration,
    /// Stress tests for the configured duration.
    Stress,
    /// Start the testkit backend (and a browser for browser targets).
    Backend,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Build => "build",
            Stage::Unit => "unit",
            Stage::Integration => "integration",
            Stage::Stress => "stress",
            Stage::Backend => "backend",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection probe deciding when the backend is serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessProbe {
    /// `host:port` to connect to.
    pub address: String,
    pub timeout: Duration,
    pub interval: Duration,
}

/// Backend stage: a long-running server and an optional browser started once
/// the server is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendPlan {
    pub server: Invocation,
    pub browser: Option<Invocation>,
    /// Present exactly when `browser` is.
    pub readiness: Option<ReadinessProbe>,
}

/// `--ignore=<package>` excluding whichever package is not under test.
fn ignore_flag(lite_target: bool) -> String {
    let ignored = if lite_target { FULL_PACKAGE } else { LITE_PACKAGE };
    format!("--ignore={ignored}")
}

fn in_repo(settings: &Settings, program: &str) -> Invocation {
    Invocation::new(program)
        .current_dir(&settings.driver_repo)
        .output(OutputPolicy::MergeStderr)
}

/// Directory argument with a trailing separator so `cp` copies the contents.
fn dir_contents_arg(path: &Path) -> String {
    let mut arg = path.display().to_string();
    if !arg.ends_with('/') {
        arg.push('/');
    }
    arg
}

/// Copy sources into the driver repo, reinstall dependencies, and build.
pub fn build_plan(cfg: &RunConfig, settings: &Settings) -> Vec<Invocation> {
    let repo = settings.driver_repo.display().to_string();
    let mut plan = vec![
        Invocation::new("cp")
            .args([
                "-fr",
                dir_contents_arg(&settings.source_dir).as_str(),
                repo.as_str(),
            ])
            .output(OutputPolicy::MergeStderr),
        Invocation::new("chown")
            .args(["-Rh", settings.driver_owner.as_str(), repo.as_str()])
            .output(OutputPolicy::MergeStderr),
        in_repo(settings, "rm").args(["-fr", "node_modules"]),
        in_repo(settings, "yarn").args(["install", "--ignore-engines"]),
        in_repo(settings, "yarn").args(["run", "build::deno", "--", "--", "--output=lib2/"]),
    ];
    // The freshly generated deno lib must match the committed one.
    if cfg.deno && cfg.team_city {
        plan.push(in_repo(settings, "diff").args(["-r", "-u", DENO_LIB, DENO_LIB_CHECK]));
    }
    plan
}

pub fn unit_plan(cfg: &RunConfig, settings: &Settings) -> Vec<Invocation> {
    let ignore = ignore_flag(cfg.lite || cfg.deno);
    let mut plan = vec![
        in_repo(settings, "yarn").args(["run", "test::unit", "--", ignore.as_str()]),
    ];
    if cfg.deno {
        plan.push(in_repo(settings, "yarn").args(["run", "test::deno"]));
    }
    plan
}

pub fn integration_plan(cfg: &RunConfig, settings: &Settings) -> Vec<Invocation> {
    if cfg.deno || (cfg.browser && cfg.skip_browser) {
        return Vec::new();
    }
    let script = if cfg.browser {
        "test::browser"
    } else {
        "test::integration"
    };
    let ignore = ignore_flag(cfg.lite);
    vec![
        in_repo(settings, "npm")
            .args(["run", script, "--", ignore.as_str()])
            .env("TEST_NEO4J_IPV6_ENABLED", "False")
            .env("TEST_CONTAINERS_DISABLED", "True"),
    ]
}

pub fn stress_plan(cfg: &RunConfig, settings: &Settings) -> Vec<Invocation> {
    if cfg.browser {
        return Vec::new();
    }
    let ignore = ignore_flag(cfg.lite);
    vec![
        in_repo(settings, "npm")
            .args(["run", "test::stress", "--", ignore.as_str()])
            .env("STRESS_TEST_MODE", "fastest")
            .env("RUNNING_TIME_IN_SECONDS", cfg.stress_duration_secs.to_string()),
    ]
}

pub fn backend_plan(cfg: &RunConfig, settings: &Settings) -> BackendPlan {
    let script = if cfg.deno {
        "start-testkit-backend::deno"
    } else {
        "start-testkit-backend"
    };

    let output = if settings.capture_backend_logs {
        OutputPolicy::LogFiles {
            stdout: settings.artifacts_dir.join(BACKEND_STDOUT_LOG),
            stderr: Some(settings.artifacts_dir.join(BACKEND_STDERR_LOG)),
        }
    } else {
        OutputPolicy::Inherit
    };

    let mut server = Invocation::new("npm")
        .args(["run", script])
        .current_dir(&settings.driver_repo)
        .output(output);
    if cfg.browser {
        server = server.env("TEST_ENVIRONMENT", "REMOTE");
    }
    if let Some(session_type) = &cfg.session_type {
        server = server.env("SESSION_TYPE", session_type.as_str());
    }

    let (browser, readiness) = if cfg.launches_browser() {
        let browser = Invocation::new(settings.browser.program.as_str())
            .args([
                "-profile",
                settings.browser.profile.as_str(),
                "-headless",
                settings.browser.url.as_str(),
            ])
            .current_dir(&settings.driver_repo);
        // The browser session sees the same test environment as the server.
        let browser = server
            .env
            .iter()
            .fold(browser, |browser, (key, value)| browser.env(key.as_str(), value.as_str()));
        let readiness = ReadinessProbe {
            address: settings.backend.readiness_address.clone(),
            timeout: settings.backend.readiness_timeout(),
            interval: settings.backend.readiness_interval(),
        };
        (Some(browser), Some(readiness))
    } else {
        (None, None)
    };

    BackendPlan {
        server,
        browser,
        readiness,
    }
}

/// Plan for a stage that runs its invocations one after another. `None` for the
/// backend stage, which is planned by [`backend_plan`].
pub fn sequential_plan(
    stage: Stage,
    cfg: &RunConfig,
    settings: &Settings,
) -> Option<Vec<Invocation>> {
    match stage {
        Stage::Build => Some(build_plan(cfg, settings)),
        Stage::Unit => Some(unit_plan(cfg, settings)),
        Stage::Integration => Some(integration_plan(cfg, settings)),
        Stage::Stress => Some(stress_plan(cfg, settings)),
        Stage::Backend => None,
    }
}
