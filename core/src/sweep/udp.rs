//! UDP probe sweep.
//!
//! Same batching discipline as the TCP sweep, different evidence: each probe
//! sends the port's conventional query and waits for *any* datagram back on
//! that socket. Even a protocol-level error reply proves a listener.
//!
//! UDP has no deterministic "closed" signal unless the peer volunteers an
//! ICMP unreachable (which surfaces here as a socket error). Silence is
//! therefore ambiguous — open-but-quiet services are reported as absent.
//! That is a known false-negative source inherent to the protocol, not a
//! defect; the throttle still only eats silence, exactly as in TCP.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::info;

use crate::probe::{Probe, ProbeOutcome, ProbeSet};
use crate::sweep::{self, SweepOptions};
use sweepr_protocols::payloads;

/// Probes `hosts` × `ports` and returns host → UDP ports that answered.
///
/// `ports` of `None` selects the built-in discovery-port table.
pub async fn udp_sweep(
    hosts: &[IpAddr],
    ports: Option<&[u16]>,
    opts: &SweepOptions,
) -> HashMap<IpAddr, Vec<u16>> {
    let ports: Vec<u16> = match ports {
        Some(explicit) if !explicit.is_empty() => explicit.to_vec(),
        _ => payloads::discovery_ports(),
    };

    if hosts.is_empty() {
        return HashMap::new();
    }

    let probes = ProbeSet::new(hosts.to_vec(), ports.clone());
    let total: usize = probes.len();
    info!(
        "UDP sweep: {} targets x {} ports = {} probes",
        hosts.len(),
        ports.len(),
        total
    );

    let responded = sweep::run_batched(probes, total, opts, datagram_probe).await;
    sweep::collect_by_host(responded)
}

async fn datagram_probe(probe: Probe, limit: Duration) -> (Probe, ProbeOutcome) {
    let outcome = match exchange_datagram(probe, limit).await {
        Ok(outcome) => outcome,
        // Local socket failure or an ICMP error bounced into send/recv:
        // deterministic, so it must not feed the throttle.
        Err(_) => ProbeOutcome::Closed,
    };
    (probe, outcome)
}

async fn exchange_datagram(probe: Probe, limit: Duration) -> anyhow::Result<ProbeOutcome> {
    let target: SocketAddr = SocketAddr::new(probe.addr, probe.port);
    let bind_addr: &str = if probe.addr.is_ipv4() {
        "0.0.0.0:0"
    } else {
        "[::]:0"
    };

    let socket = UdpSocket::bind(bind_addr).await?;
    socket.connect(target).await?;

    let payload: Vec<u8> = payloads::probe_for_port(probe.port);
    socket.send(&payload).await?;

    let mut buf = [0u8; 2048];
    match timeout(limit, socket.recv(&mut buf)).await {
        // Anything back, even zero-length or an error reply, is a listener.
        Ok(Ok(_len)) => Ok(ProbeOutcome::Open),
        Ok(Err(_refused)) => Ok(ProbeOutcome::Closed),
        Err(_elapsed) => Ok(ProbeOutcome::NoResponse),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
