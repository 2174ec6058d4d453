//! TCP connect sweep.
//!
//! A plain bounded handshake against every (host, port) pair: no raw
//! sockets, no privileges. `connection refused` is a deterministic negative
//! (the host answered, the port is shut) and is kept apart from silence,
//! which is the only outcome that feeds congestion control.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

use crate::probe::{Probe, ProbeOutcome, ProbeSet};
use crate::sweep::{self, SweepOptions};

/// Sweeps `hosts` × `ports` and returns host → open TCP ports.
///
/// Restartable for a disjoint target set; not resumable mid-flight.
pub async fn tcp_sweep(
    hosts: &[IpAddr],
    ports: &[u16],
    opts: &SweepOptions,
) -> HashMap<IpAddr, Vec<u16>> {
    if hosts.is_empty() || ports.is_empty() {
        return HashMap::new();
    }

    let probes = ProbeSet::new(hosts.to_vec(), ports.to_vec());
    let total: usize = probes.len();
    info!(
        "TCP sweep: {} targets x {} ports = {} probes",
        hosts.len(),
        ports.len(),
        total
    );

    let open: Vec<Probe> = sweep::run_batched(probes, total, opts, connect_probe).await;
    sweep::collect_by_host(open)
}

async fn connect_probe(probe: Probe, limit: Duration) -> (Probe, ProbeOutcome) {
    let socket_addr: SocketAddr = SocketAddr::new(probe.addr, probe.port);

    let outcome = match timeout(limit, TcpStream::connect(socket_addr)).await {
        Ok(Ok(_stream)) => ProbeOutcome::Open,
        // Refused or otherwise rejected: the path works, the port does not.
        Ok(Err(_)) => ProbeOutcome::Closed,
        Err(_elapsed) => ProbeOutcome::NoResponse,
    };

    (probe, outcome)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
