//! Readiness probe for the testkit backend.
//!
//! Polls a TCP connect against the backend address instead of sleeping a fixed
//! settle delay. Between attempts the probe waits on the server process itself,
//! so a backend that crashes during startup fails the probe immediately.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::core::plan::ReadinessProbe;
use crate::error::ReadinessError;
use crate::io::process::RunningProcess;

/// Block until `probe.address` accepts a connection.
///
/// Returns the number of attempts it took.
#[instrument(skip_all, fields(address = %probe.address, timeout_ms = millis(probe.timeout)))]
pub fn wait_for_server(
    server: &mut RunningProcess,
    probe: &ReadinessProbe,
) -> Result<u32, ReadinessError> {
    let addrs = resolve(&probe.address)?;
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts = attempts.saturating_add(1);
        if addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, probe.interval).is_ok())
        {
            debug!(attempts, elapsed_ms = millis(start.elapsed()), "server ready");
            return Ok(attempts);
        }

        if start.elapsed() >= probe.timeout {
            warn!(attempts, "server not ready before timeout");
            return Err(ReadinessError::Timeout {
                address: probe.address.clone(),
                attempts,
                elapsed_ms: start.elapsed().as_millis(),
            });
        }

        if let Some(status) = server
            .wait_timeout(probe.interval)
            .map_err(ReadinessError::Wait)?
        {
            warn!(exit_code = ?status.code(), "server exited during readiness probe");
            return Err(ReadinessError::ServerExited {
                address: probe.address.clone(),
                code: status.code(),
            });
        }
    }
}

/// Milliseconds as a tracing field, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn resolve(address: &str) -> Result<Vec<SocketAddr>, ReadinessError> {
    let addrs: Vec<SocketAddr> = address
        .to_socket_addrs()
        .map_err(|source| ReadinessError::Resolve {
            address: address.to_string(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ReadinessError::NoAddress {
            address: address.to_string(),
        });
    }
    Ok(addrs)
}
