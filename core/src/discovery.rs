//! # Full Network Discovery
//!
//! Composes the sub-scans into one call: validate and expand the target
//! ranges, bound the candidate set on very large ranges, run the ARP
//! pre-pass, broadcast discovery and the TCP/UDP sweeps as configured, and
//! merge everything into a single [`DiscoveryResult`].
//!
//! A malformed range is skipped and recorded, never fatal. The worst case
//! on total failure of every sub-scan is an empty result.

pub mod arp;
pub mod broadcast;

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use pnet::ipnetwork::Ipv4Network;
use tracing::{info, warn};

use crate::result::DiscoveryResult;
use crate::sweep::{ProgressCallback, SweepOptions, tcp, udp};
use sweepr_common::config::ScanConfig;
use sweepr_common::network::range;

/// Caller-supplied side channels for one discovery run. Both are optional
/// and neither can affect scan correctness.
#[derive(Default, Clone)]
pub struct DiscoveryHooks {
    /// Cooperative stop signal, honoured between sweep batches.
    pub stop: Option<Arc<AtomicBool>>,
    /// Batch-level progress notifications.
    pub progress: Option<ProgressCallback>,
}

/// Discovers live hosts and open ports across `networks`.
pub async fn full_discovery(
    networks: &[String],
    cfg: &ScanConfig,
    hooks: DiscoveryHooks,
) -> DiscoveryResult {
    let started: Instant = Instant::now();
    let mut result = DiscoveryResult::default();

    let valid: Vec<(String, Ipv4Network)> = validate_networks(networks, &mut result.errors);
    let candidates: Vec<IpAddr> = gather_candidates(&valid, cfg);

    if cfg.include_arp {
        for (raw, _) in &valid {
            for entry in arp::arp_discovery(raw, cfg.arp_timeout).await {
                result.discovered_hosts.insert(entry.addr);
                result.arp_entries.push(entry);
            }
        }
    }

    if cfg.include_broadcast {
        for (raw, _) in &valid {
            for responder in broadcast::broadcast_discovery(raw).await {
                result.discovered_hosts.insert(responder.addr);
                result.responders.push(responder);
            }
        }
    }

    let mut opts: SweepOptions = SweepOptions::from_config(cfg);
    opts.stop = hooks.stop;
    opts.progress = hooks.progress;

    if cfg.include_tcp {
        result.tcp_ports = tcp::tcp_sweep(&candidates, &cfg.tcp_ports, &opts).await;
    }

    if cfg.include_udp {
        result.udp_ports = udp::udp_sweep(&candidates, cfg.udp_ports.as_deref(), &opts).await;
    }

    result.total_hosts_found = result.all_hosts().len();
    result.elapsed = started.elapsed();
    info!(
        "discovery finished: {} hosts across {} ranges in {:.2}s",
        result.total_hosts_found,
        valid.len(),
        result.elapsed.as_secs_f64()
    );

    result
}

/// Parses every range, recording an error per unparsable one instead of
/// aborting the call.
fn validate_networks(networks: &[String], errors: &mut Vec<String>) -> Vec<(String, Ipv4Network)> {
    let mut valid: Vec<(String, Ipv4Network)> = Vec::new();

    for raw in networks {
        match range::parse_network(raw) {
            Ok(net) => valid.push((raw.clone(), net)),
            Err(e) => {
                warn!("skipping target range: {e}");
                errors.push(e.to_string());
            }
        }
    }

    valid
}

/// Expands the valid ranges into one deduplicated candidate list, sampled
/// per range and across ranges so the combined sweep stays bounded.
fn gather_candidates(valid: &[(String, Ipv4Network)], cfg: &ScanConfig) -> Vec<IpAddr> {
    let mut candidates: Vec<IpAddr> = Vec::new();
    let mut seen: HashSet<IpAddr> = HashSet::new();

    for (_, net) in valid {
        let hosts = if cfg.sample_large_networks {
            range::candidate_hosts(net, range::MAX_SWEEP_HOSTS)
        } else {
            range::expand_hosts(net)
        };

        for host in hosts {
            let addr: IpAddr = IpAddr::V4(host);
            if seen.insert(addr) {
                candidates.push(addr);
            }
        }
    }

    if cfg.sample_large_networks && candidates.len() > range::MAX_SWEEP_HOSTS {
        info!(
            "sampling {} combined candidates down to {}",
            candidates.len(),
            range::MAX_SWEEP_HOSTS
        );
        candidates = range::sample_hosts(&candidates, range::MAX_SWEEP_HOSTS);
    }

    candidates
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> ScanConfig {
        ScanConfig {
            include_arp: false,
            include_broadcast: false,
            include_tcp: false,
            include_udp: false,
            ..ScanConfig::default()
        }
    }

    #[tokio::test]
    async fn unparsable_network_records_an_error_without_raising() {
        let result = full_discovery(&["invalid".to_string()], &offline_config(), DiscoveryHooks::default()).await;

        assert_eq!(result.total_hosts_found, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("invalid"));
    }

    #[tokio::test]
    async fn bad_range_skips_while_good_ranges_proceed() {
        let networks = vec!["10.0.0.0/30".to_string(), "999.0.0.0/8".to_string()];
        let result = full_discovery(&networks, &offline_config(), DiscoveryHooks::default()).await;

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.total_hosts_found, 0);
    }

    #[test]
    fn candidates_are_sampled_and_deduplicated() {
        let cfg = ScanConfig::default();
        let valid = vec![
            (
                "10.0.0.0/16".to_string(),
                range::parse_network("10.0.0.0/16").unwrap(),
            ),
            (
                "10.0.0.0/24".to_string(),
                range::parse_network("10.0.0.0/24").unwrap(),
            ),
        ];

        let candidates = gather_candidates(&valid, &cfg);
        assert!(candidates.len() <= range::MAX_SWEEP_HOSTS);

        let distinct: HashSet<IpAddr> = candidates.iter().copied().collect();
        assert_eq!(distinct.len(), candidates.len());
    }

    #[test]
    fn sampling_can_be_disabled() {
        let cfg = ScanConfig {
            sample_large_networks: false,
            ..ScanConfig::default()
        };
        let valid = vec![(
            "10.0.0.0/24".to_string(),
            range::parse_network("10.0.0.0/24").unwrap(),
        )];

        assert_eq!(gather_candidates(&valid, &cfg).len(), 254);
    }
}
