use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::Args;

use crate::commands::Tuning;
use crate::terminal::{input, print, progress};
use sweepr_common::network::target::Targets;
use sweepr_common::{config::ScanConfig, ports, success};
use sweepr_core::anomaly;
use sweepr_core::discovery::{self, DiscoveryHooks};

#[derive(Args)]
pub struct SweepArgs {
    /// Networks to sweep, e.g. "192.168.1.0/24"
    pub targets: Targets,

    #[command(flatten)]
    pub tuning: Tuning,
}

/// A bare TCP connect sweep: no ARP, no broadcast, no UDP.
pub async fn sweep(args: SweepArgs) -> anyhow::Result<()> {
    let mut cfg = ScanConfig {
        probe_timeout: Duration::from_millis(args.tuning.timeout_ms),
        initial_batch: args.tuning.batch,
        include_arp: false,
        include_broadcast: false,
        include_udp: false,
        ..ScanConfig::default()
    };
    if let Some(spec) = &args.tuning.ports {
        cfg.tcp_ports = ports::parse_ports(spec)?;
    }

    print::header("tcp sweep");

    let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    input::arm_stop_key(stop.clone());

    let bar = progress::sweep_bar();
    let hooks = DiscoveryHooks {
        stop: Some(stop),
        progress: Some(progress::as_callback(bar.clone())),
    };

    let result = discovery::full_discovery(args.targets.networks(), &cfg, hooks).await;
    bar.finish_and_clear();

    let findings = anomaly::detect_anomalies(&result.tcp_ports, None);
    print::report(&result, &findings, None);
    success!(
        "Sweep complete: {} hosts in {:.2}s",
        result.total_hosts_found,
        result.elapsed.as_secs_f64()
    );

    Ok(())
}
