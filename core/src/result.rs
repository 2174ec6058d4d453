//! Aggregate result types handed to the engine's collaborators.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::Duration;

/// A host seen by the layer-2 pre-pass. MAC and vendor text come straight
/// from the external tool's output when it prints them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub addr: IpAddr,
    pub mac: Option<String>,
    pub vendor: Option<String>,
}

/// Which discovery datagram a responder answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryProtocol {
    Ssdp,
    Mdns,
    Wiz,
}

impl DiscoveryProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryProtocol::Ssdp => "ssdp",
            DiscoveryProtocol::Mdns => "mdns",
            DiscoveryProtocol::Wiz => "wiz",
        }
    }
}

/// A host that answered a broadcast/multicast discovery datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResponder {
    pub addr: IpAddr,
    pub protocol: DiscoveryProtocol,
    /// mDNS responders often volunteer a name; the others do not.
    pub hostname: Option<String>,
}

/// Everything one full discovery run learned. Built incrementally by the
/// orchestrator, immutable once returned.
#[derive(Debug, Default)]
pub struct DiscoveryResult {
    /// Host → open TCP ports.
    pub tcp_ports: HashMap<IpAddr, Vec<u16>>,
    /// Host → UDP ports that answered something.
    pub udp_ports: HashMap<IpAddr, Vec<u16>>,
    /// Hosts known to exist with no port data (ARP/broadcast finds).
    pub discovered_hosts: HashSet<IpAddr>,
    pub arp_entries: Vec<ArpEntry>,
    pub responders: Vec<BroadcastResponder>,
    /// Distinct hosts across every sub-scan.
    pub total_hosts_found: usize,
    pub elapsed: Duration,
    /// Per-range configuration errors; a bad range skips, it never aborts.
    pub errors: Vec<String>,
}

impl DiscoveryResult {
    /// Every distinct host any sub-scan saw.
    pub fn all_hosts(&self) -> HashSet<IpAddr> {
        let mut hosts: HashSet<IpAddr> = self.discovered_hosts.clone();
        hosts.extend(self.tcp_ports.keys().copied());
        hosts.extend(self.udp_ports.keys().copied());
        hosts
    }

    /// The UDP hits of one host, annotated with the conventional service of
    /// each discovery port.
    pub fn udp_services(&self, addr: &IpAddr) -> Vec<(u16, Option<&'static str>)> {
        self.udp_ports
            .get(addr)
            .map(|ports| {
                ports
                    .iter()
                    .map(|&port| (port, sweepr_protocols::payloads::service_for_port(port)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
