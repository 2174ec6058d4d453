//! UDP broadcast/multicast service discovery.
//!
//! One datagram to a shared address, then a short passive listen: SSDP to
//! its multicast group, an mDNS service-enumeration query to its group, and
//! the WiZ registration packet to the broadcast address. Small networks get
//! the same three payloads unicast to every host, which reaches devices
//! that ignore broadcast (or networks that filter it).
//!
//! Every socket and send error here degrades to "nothing discovered via
//! this protocol". Broadcast discovery never fails a run.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use crate::result::{BroadcastResponder, DiscoveryProtocol};
use sweepr_common::network::range;
use sweepr_protocols::{mdns, ssdp, wiz};

/// Passive listen window after a broadcast/multicast send.
const BROADCAST_WINDOW: Duration = Duration::from_millis(300);
/// Reply window per unicast probe; shorter, one host is being asked.
const UNICAST_WINDOW: Duration = Duration::from_millis(100);
/// Networks at or below this many candidates also get per-host unicasts.
const UNICAST_LIMIT: usize = 100;

struct DiscoveryProbe {
    dest: SocketAddr,
    payload: Vec<u8>,
    protocol: DiscoveryProtocol,
}

fn discovery_probes() -> Vec<DiscoveryProbe> {
    vec![
        DiscoveryProbe {
            dest: SocketAddr::new(IpAddr::V4(ssdp::SSDP_GROUP), ssdp::SSDP_PORT),
            payload: ssdp::build_msearch(),
            protocol: DiscoveryProtocol::Ssdp,
        },
        DiscoveryProbe {
            dest: SocketAddr::new(IpAddr::V4(mdns::MDNS_GROUP), mdns::MDNS_PORT),
            payload: mdns::build_query(),
            protocol: DiscoveryProtocol::Mdns,
        },
        DiscoveryProbe {
            dest: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), wiz::WIZ_PORT),
            payload: wiz::build_registration(),
            protocol: DiscoveryProtocol::Wiz,
        },
    ]
}

/// Runs all three discovery protocols against one network range and returns
/// the distinct responders.
pub async fn broadcast_discovery(network: &str) -> Vec<BroadcastResponder> {
    let net = match range::parse_network(network) {
        Ok(net) => net,
        Err(e) => {
            warn!("broadcast discovery skipped: {e}");
            return Vec::new();
        }
    };

    let probes: Vec<DiscoveryProbe> = discovery_probes();
    let mut found: Vec<BroadcastResponder> = Vec::new();

    for probe in &probes {
        if let Err(e) = broadcast_round(probe, &mut found).await {
            debug!("{} broadcast yielded nothing: {e}", probe.protocol.as_str());
        }
    }

    // Size check before expansion so a /8 never materializes its hosts.
    if (net.size() as usize) <= UNICAST_LIMIT + 2 {
        let hosts = range::expand_hosts(&net);
        if hosts.len() <= UNICAST_LIMIT {
            for host in &hosts {
                for probe in &probes {
                    if let Err(e) = unicast_round(IpAddr::V4(*host), probe, &mut found).await {
                        debug!(
                            "{} unicast to {host} yielded nothing: {e}",
                            probe.protocol.as_str()
                        );
                    }
                }
            }
        }
    }

    dedup_responders(found)
}

async fn broadcast_round(
    probe: &DiscoveryProbe,
    found: &mut Vec<BroadcastResponder>,
) -> anyhow::Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;
    socket.send_to(&probe.payload, probe.dest).await?;
    collect_replies(&socket, probe.protocol, BROADCAST_WINDOW, found).await;
    Ok(())
}

async fn unicast_round(
    host: IpAddr,
    probe: &DiscoveryProbe,
    found: &mut Vec<BroadcastResponder>,
) -> anyhow::Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    let dest: SocketAddr = SocketAddr::new(host, probe.dest.port());
    socket.send_to(&probe.payload, dest).await?;
    collect_replies(&socket, probe.protocol, UNICAST_WINDOW, found).await;
    Ok(())
}

/// Drains replies from one socket until its window closes.
async fn collect_replies(
    socket: &UdpSocket,
    protocol: DiscoveryProtocol,
    window: Duration,
    found: &mut Vec<BroadcastResponder>,
) {
    let deadline: Instant = Instant::now() + window;
    let mut buf = [0u8; 4096];

    loop {
        let left: Duration = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            break;
        }

        match timeout(left, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                found.push(make_responder(protocol, from.ip(), &buf[..len]));
            }
            Ok(Err(_)) | Err(_) => break,
        }
    }
}

fn make_responder(protocol: DiscoveryProtocol, addr: IpAddr, data: &[u8]) -> BroadcastResponder {
    // A malformed reply still proves a live host; it just carries no name.
    let mut hostname: Option<String> = None;
    let recognised: bool = match protocol {
        DiscoveryProtocol::Ssdp => ssdp::is_search_response(data),
        DiscoveryProtocol::Wiz => wiz::is_registration_response(data),
        DiscoveryProtocol::Mdns => match mdns::extract_responder(data) {
            Ok(record) => {
                hostname = record.hostname;
                true
            }
            Err(_) => false,
        },
    };

    if !recognised {
        debug!(
            "{addr} answered the {} probe with an unexpected payload",
            protocol.as_str()
        );
    }

    BroadcastResponder {
        addr,
        protocol,
        hostname,
    }
}

/// One responder per (address, protocol); a later duplicate may still donate
/// its hostname to the kept entry.
fn dedup_responders(found: Vec<BroadcastResponder>) -> Vec<BroadcastResponder> {
    let mut distinct: Vec<BroadcastResponder> = Vec::with_capacity(found.len());

    for responder in found {
        match distinct
            .iter_mut()
            .find(|kept| kept.addr == responder.addr && kept.protocol == responder.protocol)
        {
            Some(kept) => {
                if kept.hostname.is_none() {
                    kept.hostname = responder.hostname;
                }
            }
            None => distinct.push(responder),
        }
    }

    distinct
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

    #[tokio::test]
    async fn invalid_network_discovers_nothing() {
        assert!(broadcast_discovery("invalid").await.is_empty());
    }

    #[test]
    fn the_three_protocols_are_probed() {
        let probes = discovery_probes();
        assert_eq!(probes.len(), 3);

        assert_eq!(probes[0].dest.port(), 1900);
        assert!(probes[0].payload.starts_with(b"M-SEARCH"));

        assert_eq!(probes[1].dest.port(), 5353);
        assert!(probes[1].payload.windows(9).any(|w| w == b"_services"));

        assert_eq!(probes[2].dest.port(), 38899);
        assert!(probes[2].payload.windows(12).any(|w| w == b"registration"));
    }

    #[test]
    fn dedup_keeps_first_and_backfills_hostnames() {
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        let found = vec![
            BroadcastResponder {
                addr,
                protocol: DiscoveryProtocol::Mdns,
                hostname: None,
            },
            BroadcastResponder {
                addr,
                protocol: DiscoveryProtocol::Mdns,
                hostname: Some("printer.local".to_string()),
            },
            BroadcastResponder {
                addr,
                protocol: DiscoveryProtocol::Ssdp,
                hostname: None,
            },
        ];

        let distinct = dedup_responders(found);
        assert_eq!(distinct.len(), 2);
        assert_eq!(distinct[0].hostname.as_deref(), Some("printer.local"));
    }
}
