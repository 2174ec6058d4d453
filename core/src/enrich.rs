//! Service-name enrichment via an external fingerprinting tool.
//!
//! The engine itself never identifies services; when `nmap` is installed
//! this call-out annotates the discovered host→ports map with its `-sV`
//! guesses. The caller decides whether to merge the answer — the engine's
//! own result is never mutated.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::discovery::arp::find_in_path;

/// Host → port → service-name guesses, or `None` when `nmap` is absent or
/// there is nothing to enrich.
pub async fn nmap_enrichment(
    open_ports: &HashMap<IpAddr, Vec<u16>>,
    per_host_limit: Duration,
) -> Option<HashMap<IpAddr, HashMap<u16, String>>> {
    let bin = find_in_path("nmap")?;
    if open_ports.is_empty() {
        return None;
    }

    let mut services: HashMap<IpAddr, HashMap<u16, String>> = HashMap::new();

    for (addr, ports) in open_ports {
        if ports.is_empty() {
            continue;
        }

        let port_list: String = ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<String>>()
            .join(",");

        let target: String = addr.to_string();
        let run = Command::new(&bin)
            .args(["-sV", "-p", port_list.as_str(), target.as_str()])
            .output();

        let output = match timeout(per_host_limit, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!("nmap failed for {addr}: {e}");
                continue;
            }
            Err(_elapsed) => {
                debug!("nmap timed out for {addr}");
                continue;
            }
        };

        let stdout: String = String::from_utf8_lossy(&output.stdout).into_owned();
        let parsed: HashMap<u16, String> = parse_service_lines(&stdout);
        if !parsed.is_empty() {
            services.insert(*addr, parsed);
        }
    }

    if services.is_empty() {
        None
    } else {
        Some(services)
    }
}

/// Pulls `<port>/tcp open <service>` rows out of nmap's plain output.
fn parse_service_lines(stdout: &str) -> HashMap<u16, String> {
    let mut services: HashMap<u16, String> = HashMap::new();

    for line in stdout.lines() {
        let mut tokens = line.split_whitespace();
        let Some(spec) = tokens.next() else { continue };
        let Some((port_str, proto)) = spec.split_once('/') else {
            continue;
        };
        if proto != "tcp" {
            continue;
        }
        let Ok(port) = port_str.parse::<u16>() else {
            continue;
        };

        if tokens.next() != Some("open") {
            continue;
        }
        if let Some(service) = tokens.next() {
            services.insert(port, service.to_string());
        }
    }

    services
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_service_rows() {
        let stdout = "Starting Nmap 7.94\n\
                      PORT    STATE  SERVICE\n\
                      80/tcp  open   http\n\
                      443/tcp open   https\n\
                      445/tcp closed microsoft-ds\n\
                      53/udp  open   domain\n";

        let services = parse_service_lines(stdout);
        assert_eq!(services.len(), 2);
        assert_eq!(services[&80], "http");
        assert_eq!(services[&443], "https");
        assert!(!services.contains_key(&445));
        assert!(!services.contains_key(&53));
    }

    #[test]
    fn header_noise_is_ignored() {
        assert!(parse_service_lines("Nmap done: 1 IP address\n").is_empty());
        assert!(parse_service_lines("PORT STATE SERVICE\n").is_empty());
    }

    #[tokio::test]
    async fn empty_map_enriches_nothing() {
        // Regardless of whether nmap is installed, nothing-in means None-out.
        let empty: HashMap<IpAddr, Vec<u16>> = HashMap::new();
        assert!(
            nmap_enrichment(&empty, Duration::from_secs(1))
                .await
                .is_none()
        );
    }
}
