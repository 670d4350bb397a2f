//! CI stages for the driver testkit.
//!
//! Each subcommand is one stage of the container pipeline. Which commands a
//! stage runs is decided by `TEST_DRIVER_*` environment flags; paths and
//! readiness timing come from an optional `testkit.toml`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use testkit::backend::run_backend;
use testkit::core::plan::{Stage, backend_plan, sequential_plan};
use testkit::core::run_config::RunConfig;
use testkit::io::env::ProcessEnv;
use testkit::io::runner::SystemRunner;
use testkit::io::settings::{DEFAULT_SETTINGS_PATH, load_settings};
use testkit::stage::run_plan;
use testkit::{dry_run, exit_codes, logging};

#[derive(Parser)]
#[command(name = "testkit", version, about = "CI stages for the driver testkit")]
struct Cli {
    /// Settings file (TOML). Defaults apply when the file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Print the planned commands without running them.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the dry-run plan as JSON.
    #[arg(long, global = true, requires = "dry_run")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy the driver into the repo directory, install dependencies, and build.
    Build,
    /// Run unit tests.
    Unit,
    /// Run integration tests.
    Integration,
    /// Run stress tests for `TEST_NEO4J_STRESS_DURATION` seconds.
    Stress,
    /// Start the testkit backend, plus a headless browser for browser targets.
    Backend,
}

impl Command {
    fn stage(&self) -> Stage {
        match self {
            Command::Build => Stage::Build,
            Command::Unit => Stage::Unit,
            Command::Integration => Stage::Integration,
            Command::Stress => Stage::Stress,
            Command::Backend => Stage::Backend,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init();
    if let Err(err) = run(cli) {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::for_error(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let stage = cli.command.stage();
    let cfg = RunConfig::from_env(&ProcessEnv).context("read environment flags")?;
    let settings = load_settings(&cli.settings)?;
    debug!(?cfg, ?settings, %stage, "configuration loaded");

    if cli.dry_run {
        print!("{}", dry_run::render(stage, &cfg, &settings, cli.json)?);
        return Ok(());
    }

    match sequential_plan(stage, &cfg, &settings) {
        Some(plan) => run_plan(stage, &plan, &SystemRunner).map(|_| ()),
        None => run_backend(&backend_plan(&cfg, &settings)),
    }
}
