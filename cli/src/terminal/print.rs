use std::collections::HashMap;
use std::net::IpAddr;

use colored::*;

use sweepr_core::anomaly::AnomalyFinding;
use sweepr_core::result::DiscoveryResult;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    println!(
        "{}{}{}",
        "─".repeat(left).bright_black(),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right).bright_black()
    );
}

pub fn fat_separator() {
    println!("{}", "═".repeat(TOTAL_WIDTH).bright_black());
}

pub fn centerln(msg: &str) {
    let width: usize = console::measure_text_width(msg);
    let space: String = " ".repeat(TOTAL_WIDTH.saturating_sub(width) / 2);
    println!("{space}{msg}");
}

/// Renders one finished discovery run: hosts with their ports, then the
/// anomaly findings, then any per-range errors.
pub fn report(
    result: &DiscoveryResult,
    findings: &[AnomalyFinding],
    hints: Option<&HashMap<IpAddr, HashMap<u16, String>>>,
) {
    let mut hosts: Vec<IpAddr> = result.all_hosts().into_iter().collect();
    hosts.sort();

    if hosts.is_empty() {
        centerln(&"zero hosts detected".red().bold().to_string());
    }

    for (idx, host) in hosts.iter().enumerate() {
        print_host(result, hints, idx, *host);
        if idx + 1 != hosts.len() {
            println!();
        }
    }

    if !findings.is_empty() {
        println!();
        header("anomalies");
        for finding in findings {
            let severity: ColoredString = match finding.severity {
                sweepr_core::anomaly::Severity::High => finding.severity.as_str().red().bold(),
                sweepr_core::anomaly::Severity::Medium => {
                    finding.severity.as_str().yellow().bold()
                }
            };
            println!(" {} [{severity}] {}", finding.addr, finding.reason);
        }
    }

    for error in &result.errors {
        tracing::warn!("{error}");
    }

    fat_separator();
}

fn print_host(
    result: &DiscoveryResult,
    hints: Option<&HashMap<IpAddr, HashMap<u16, String>>>,
    idx: usize,
    host: IpAddr,
) {
    let name: Option<&str> = result
        .responders
        .iter()
        .find(|r| r.addr == host)
        .and_then(|r| r.hostname.as_deref());

    println!(
        "{} {}",
        format!("[{idx}]").bright_black(),
        name.unwrap_or(&host.to_string()).cyan()
    );

    let mut details: Vec<(String, String)> = Vec::new();

    if name.is_some() {
        details.push(("Address".to_string(), host.to_string()));
    }

    if let Some(ports) = result.tcp_ports.get(&host) {
        details.push(("TCP".to_string(), render_ports(host, ports, hints)));
    }

    let udp_hits = result.udp_services(&host);
    if !udp_hits.is_empty() {
        let rendered: String = udp_hits
            .iter()
            .map(|(port, service)| match service {
                Some(name) => format!("{port} ({name})"),
                None => port.to_string(),
            })
            .collect::<Vec<String>>()
            .join(", ");
        details.push(("UDP".to_string(), rendered));
    }

    if let Some(entry) = result.arp_entries.iter().find(|e| e.addr == host) {
        if let Some(mac) = &entry.mac {
            details.push(("MAC".to_string(), mac.clone()));
        }
        if let Some(vendor) = &entry.vendor {
            details.push(("Vendor".to_string(), vendor.clone()));
        }
    }

    let seen_via: Vec<&str> = result
        .responders
        .iter()
        .filter(|r| r.addr == host)
        .map(|r| r.protocol.as_str())
        .collect();
    if !seen_via.is_empty() {
        details.push(("Answered".to_string(), seen_via.join(", ")));
    }

    for (i, (key, value)) in details.iter().enumerate() {
        let branch: ColoredString = if i + 1 == details.len() {
            "└─".bright_black()
        } else {
            "├─".bright_black()
        };
        println!(" {branch} {}: {}", format!("{key:<8}").white(), value);
    }
}

fn render_ports(
    host: IpAddr,
    ports: &[u16],
    hints: Option<&HashMap<IpAddr, HashMap<u16, String>>>,
) -> String {
    ports
        .iter()
        .map(|port| {
            let service: Option<&String> =
                hints.and_then(|h| h.get(&host)).and_then(|by| by.get(port));
            match service {
                Some(name) => format!("{port} ({name})"),
                None => port.to_string(),
            }
        })
        .collect::<Vec<String>>()
        .join(", ")
}
