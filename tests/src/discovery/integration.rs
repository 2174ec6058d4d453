#![cfg(test)]
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::net::{TcpListener, UdpSocket};

use sweepr_common::config::ScanConfig;
use sweepr_core::discovery::{self, DiscoveryHooks};
use sweepr_core::sweep::{tcp, SweepOptions};

fn loopback_config() -> ScanConfig {
    ScanConfig {
        probe_timeout: Duration::from_millis(250),
        initial_batch: 100,
        min_batch: 1,
        include_arp: false,
        include_broadcast: false,
        include_udp: false,
        ..ScanConfig::default()
    }
}

/// End to end over the orchestrator: a real listener on loopback is found
/// open, an unbound loopback port is not reported.
#[tokio::test]
async fn discovery_finds_a_loopback_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open_port: u16 = listener.local_addr().unwrap().port();
    let closed_port: u16 = {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap().port()
    };

    let cfg = ScanConfig {
        tcp_ports: vec![open_port, closed_port],
        ..loopback_config()
    };

    let result = discovery::full_discovery(
        &["127.0.0.1/32".to_string()],
        &cfg,
        DiscoveryHooks::default(),
    )
    .await;

    let localhost: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.total_hosts_found, 1);
    assert_eq!(result.tcp_ports[&localhost], vec![open_port]);
}

/// An unparsable range is recorded, not raised, and the run still
/// completes with an empty result.
#[tokio::test]
async fn discovery_records_bad_ranges_without_failing() {
    let cfg = loopback_config();

    let result = discovery::full_discovery(
        &["definitely-not-a-network".to_string()],
        &cfg,
        DiscoveryHooks::default(),
    )
    .await;

    assert_eq!(result.total_hosts_found, 0);
    assert_eq!(result.errors.len(), 1);
}

/// A UDP service that answers its probe shows up in the UDP map.
#[tokio::test]
async fn discovery_reports_an_answering_udp_service() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let udp_port: u16 = server.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        while let Ok((len, from)) = server.recv_from(&mut buf).await {
            let _ = server.send_to(&buf[..len], from).await;
        }
    });

    let cfg = ScanConfig {
        include_tcp: false,
        include_udp: true,
        udp_ports: Some(vec![udp_port]),
        ..loopback_config()
    };

    let result = discovery::full_discovery(
        &["127.0.0.1/32".to_string()],
        &cfg,
        DiscoveryHooks::default(),
    )
    .await;

    let localhost: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    assert_eq!(result.udp_ports[&localhost], vec![udp_port]);
    assert_eq!(result.total_hosts_found, 1);
}

/// A pre-armed stop flag halts a sweep before its first batch.
#[tokio::test]
async fn armed_stop_flag_prevents_probing() {
    let stop = Arc::new(AtomicBool::new(true));
    let opts = SweepOptions::default().with_stop(stop);

    let localhost: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let result = tcp::tcp_sweep(&[localhost], &[80, 443], &opts).await;

    assert!(result.is_empty());
}
