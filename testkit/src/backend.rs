//! Orchestration for the backend stage.
//!
//! The server runs for the whole test session. For browser targets a headless
//! browser is started once the server accepts connections, and the stage ends
//! only after both processes have exited:
//!
//! spawn server → wait for readiness → spawn browser → join browser → join server
//!
//! If readiness or the browser fails, the server handle is dropped, which kills
//! the server's whole process group and reaps it.

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::plan::BackendPlan;
use crate::io::process;
use crate::io::readiness::wait_for_server;

#[instrument(skip_all, fields(browser = plan.browser.is_some()))]
pub fn run_backend(plan: &BackendPlan) -> Result<()> {
    info!(command = %plan.server, "starting backend");
    let mut server = process::spawn(&plan.server).context("start backend")?;

    if let Some(browser) = &plan.browser {
        if let Some(probe) = &plan.readiness {
            let attempts =
                wait_for_server(&mut server, probe).context("wait for backend readiness")?;
            info!(attempts, address = %probe.address, "backend ready");
        }

        info!(command = %browser, "starting browser");
        let browser_process = process::spawn(browser).context("start browser")?;
        browser_process.wait().context("browser")?;
        info!("browser exited");
    }

    server.wait().context("backend")?;
    info!("backend exited");
    Ok(())
}
