use std::time::Duration;

use crate::ports;

/// Parameters for one discovery run.
///
/// Sub-scan flags select which techniques run; everything else tunes the
/// adaptive sweeps. A disabled sub-scan contributes nothing to the result,
/// it never fails it.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Per-probe timeout for TCP connects and UDP replies.
    pub probe_timeout: Duration,
    /// Overall timeout for one external ARP tool invocation.
    pub arp_timeout: Duration,
    /// Concurrency the throttle controller starts from.
    pub initial_batch: usize,
    /// Hard lower clamp for the batch size.
    pub min_batch: usize,
    /// Hard upper clamp for the batch size.
    pub max_batch: usize,
    /// TCP ports swept per candidate host.
    pub tcp_ports: Vec<u16>,
    /// UDP ports probed per candidate host; `None` selects the built-in
    /// discovery-port table.
    pub udp_ports: Option<Vec<u16>>,
    pub include_arp: bool,
    pub include_broadcast: bool,
    pub include_tcp: bool,
    pub include_udp: bool,
    /// Deterministically sample very large ranges instead of sweeping
    /// every address.
    pub sample_large_networks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(500),
            arp_timeout: Duration::from_secs(15),
            initial_batch: 500,
            min_batch: 100,
            max_batch: 20_000,
            tcp_ports: ports::DEFAULT_TCP_PORTS.to_vec(),
            udp_ports: None,
            include_arp: true,
            include_broadcast: true,
            include_tcp: true,
            include_udp: true,
            sample_large_networks: true,
        }
    }
}
