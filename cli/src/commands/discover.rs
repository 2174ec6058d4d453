use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use clap::Args;

use crate::commands::Tuning;
use crate::terminal::{input, print, progress};
use sweepr_common::network::target::Targets;
use sweepr_common::{config::ScanConfig, ports, success};
use sweepr_core::discovery::{self, DiscoveryHooks};
use sweepr_core::{anomaly, enrich};

#[derive(Args)]
pub struct DiscoverArgs {
    /// Networks to discover, e.g. "192.168.1.0/24,10.0.0.0/16"
    pub targets: Targets,

    #[command(flatten)]
    pub tuning: Tuning,

    /// Skip the external layer-2 pre-pass
    #[arg(long)]
    pub no_arp: bool,

    /// Skip SSDP/mDNS/WiZ broadcast discovery
    #[arg(long)]
    pub no_broadcast: bool,

    /// Skip the TCP connect sweep
    #[arg(long)]
    pub no_tcp: bool,

    /// Skip the UDP probe sweep
    #[arg(long)]
    pub no_udp: bool,

    /// Sweep every address of large ranges instead of sampling
    #[arg(long)]
    pub no_sample: bool,

    /// Annotate open ports with service guesses via nmap, if installed
    #[arg(long)]
    pub enrich: bool,
}

pub async fn discover(args: DiscoverArgs) -> anyhow::Result<()> {
    let cfg: ScanConfig = build_config(&args)?;

    print::header("network discovery");

    let stop: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    input::arm_stop_key(stop.clone());

    let bar = progress::sweep_bar();
    let hooks = DiscoveryHooks {
        stop: Some(stop),
        progress: Some(progress::as_callback(bar.clone())),
    };

    let started: Instant = Instant::now();
    let result = discovery::full_discovery(args.targets.networks(), &cfg, hooks).await;
    bar.finish_and_clear();

    let hints = if args.enrich {
        enrich::nmap_enrichment(&result.tcp_ports, Duration::from_secs(60)).await
    } else {
        None
    };
    let findings = anomaly::detect_anomalies(&result.tcp_ports, hints.as_ref());

    print::report(&result, &findings, hints.as_ref());
    success!(
        "Discovery complete: {} hosts in {:.2}s",
        result.total_hosts_found,
        started.elapsed().as_secs_f64()
    );

    Ok(())
}

fn build_config(args: &DiscoverArgs) -> anyhow::Result<ScanConfig> {
    let mut cfg = ScanConfig {
        probe_timeout: Duration::from_millis(args.tuning.timeout_ms),
        initial_batch: args.tuning.batch,
        include_arp: !args.no_arp,
        include_broadcast: !args.no_broadcast,
        include_tcp: !args.no_tcp,
        include_udp: !args.no_udp,
        sample_large_networks: !args.no_sample,
        ..ScanConfig::default()
    };

    if let Some(spec) = &args.tuning.ports {
        cfg.tcp_ports = ports::parse_ports(spec)?;
    }

    Ok(cfg)
}
