//! # Network Range Expansion
//!
//! CIDR parsing, candidate-host expansion and deterministic sampling.
//!
//! Range expansion happens once, up front; sweeps only ever see already
//! validated address lists. Sampling keeps the probe volume bounded on very
//! large ranges (a /8 would otherwise expand to sixteen million candidates).

use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;
use tracing::debug;

use crate::error::ScanError;

/// Largest candidate list a sweep will take on without sampling.
pub const MAX_SWEEP_HOSTS: usize = 150;

/// How many addresses at each edge of a range survive sampling unconditionally.
///
/// Gateways, DHCP servers and broadcast-adjacent infrastructure cluster at
/// range edges.
const EDGE_KEEP: usize = 5;

/// Parses a `a.b.c.d/prefix` string into a validated network.
pub fn parse_network(input: &str) -> Result<Ipv4Network, ScanError> {
    let Some((ip_str, prefix_str)) = input.split_once('/') else {
        return Err(ScanError::InvalidNetwork {
            input: input.to_string(),
            reason: "missing '/prefix'".to_string(),
        });
    };

    let ip: Ipv4Addr = ip_str.parse().map_err(|e| ScanError::InvalidNetwork {
        input: input.to_string(),
        reason: format!("bad address: {e}"),
    })?;

    let prefix: u8 = prefix_str.parse().map_err(|e| ScanError::InvalidNetwork {
        input: input.to_string(),
        reason: format!("bad prefix: {e}"),
    })?;

    Ipv4Network::new(ip, prefix).map_err(|e| ScanError::InvalidNetwork {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Expands a network into its probeable hosts.
///
/// Network and broadcast addresses are stripped when the range is large
/// enough to have them; /31 and /32 keep every address.
pub fn expand_hosts(network: &Ipv4Network) -> Vec<Ipv4Addr> {
    let (start_u32, end_u32) = host_bounds(network);
    (start_u32..=end_u32).map(Ipv4Addr::from).collect()
}

/// Candidate hosts for one network, sampled down to `cap` when the range is
/// larger than that.
///
/// Sampling works on address arithmetic, so a /8 never materializes its
/// sixteen million hosts: evenly spaced offsets through the range plus the
/// first and last [`EDGE_KEEP`] addresses, same subset on every run.
pub fn candidate_hosts(network: &Ipv4Network, cap: usize) -> Vec<Ipv4Addr> {
    let (start, end) = host_bounds(network);
    let count: usize = (end - start) as usize + 1;
    if count <= cap || cap == 0 {
        return expand_hosts(network);
    }
    debug!("{network}: sampling {count} hosts down to {cap}");

    let mut picked: Vec<Ipv4Addr> = Vec::with_capacity(cap);
    let mut seen = std::collections::HashSet::with_capacity(cap);
    let mut push = |offset: u32, picked: &mut Vec<Ipv4Addr>| {
        let addr = Ipv4Addr::from(start + offset);
        if picked.len() < cap && seen.insert(addr) {
            picked.push(addr);
        }
    };

    // Both edges first so they always survive the cap, then the spaced middle.
    for offset in 0..EDGE_KEEP as u32 {
        push(offset, &mut picked);
        push((end - start) - offset, &mut picked);
    }

    let middle = cap.saturating_sub(2 * EDGE_KEEP).max(1);
    let step = (count / middle).max(1);
    for offset in (0..count).step_by(step) {
        push(offset as u32, &mut picked);
    }

    picked
}

/// First and last probeable address of a network, as u32.
fn host_bounds(network: &Ipv4Network) -> (u32, u32) {
    let net_u32: u32 = u32::from(network.network());
    let bcast_u32: u32 = u32::from(network.broadcast());

    let start_u32 = net_u32.saturating_add(1);
    let end_u32 = bcast_u32.saturating_sub(1);

    if start_u32 > end_u32 {
        // /31 and /32: no separate network/broadcast addresses to strip.
        return (net_u32, bcast_u32);
    }

    (start_u32, end_u32)
}

/// Deterministically samples a candidate list down to `cap` entries.
///
/// Keeps the first and last [`EDGE_KEEP`] addresses and evenly spaced
/// indices in between. Same input, same output; no randomness, so repeated
/// runs probe the same subset.
pub fn sample_hosts(hosts: &[IpAddr], cap: usize) -> Vec<IpAddr> {
    if hosts.len() <= cap || cap == 0 {
        return hosts.to_vec();
    }

    let mut picked: Vec<IpAddr> = Vec::with_capacity(cap);
    let mut seen = std::collections::HashSet::with_capacity(cap);
    let mut push = |addr: IpAddr, picked: &mut Vec<IpAddr>| {
        if picked.len() < cap && seen.insert(addr) {
            picked.push(addr);
        }
    };

    for addr in hosts.iter().take(EDGE_KEEP) {
        push(*addr, &mut picked);
    }

    let middle = cap.saturating_sub(2 * EDGE_KEEP).max(1);
    let step = (hosts.len() / middle).max(1);
    for addr in hosts.iter().step_by(step) {
        push(*addr, &mut picked);
    }

    for addr in hosts.iter().rev().take(EDGE_KEEP) {
        push(*addr, &mut picked);
    }

    picked
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
