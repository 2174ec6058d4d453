//! Suspicious-exposure detection over a finished host→ports map.
//!
//! Pure: derived on demand from a discovery result plus optional
//! service-name hints, inputs never mutated, nothing persisted.

use std::collections::HashMap;
use std::net::IpAddr;

/// Start of the IANA dynamic/ephemeral port range. A service deliberately
/// listening up here is unusual enough to flag.
const EPHEMERAL_PORT_FLOOR: u16 = 49_152;

/// Service-name fragments that warrant a high-severity finding on sight.
const SUSPICIOUS_SERVICE_KEYWORDS: &[&str] = &[
    "backdoor",
    "bindshell",
    "metasploit",
    "meterpreter",
    "netcat",
    "trojan",
    "rootkit",
    "botnet",
    "miner",
    "xmrig",
    "reverse-shell",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// One flagged exposure. Recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyFinding {
    pub addr: IpAddr,
    pub port: u16,
    pub severity: Severity,
    pub reason: String,
}

/// Service names conventionally expected on well-known ports. A name that
/// matches none of its port's keywords is a port/service anomaly.
fn expected_services(port: u16) -> &'static [&'static str] {
    match port {
        21 => &["ftp"],
        22 => &["ssh"],
        23 => &["telnet"],
        25 => &["smtp", "mail"],
        53 => &["dns", "domain"],
        80 => &["http", "www"],
        110 => &["pop3"],
        143 => &["imap"],
        443 => &["https", "http", "ssl"],
        445 => &["microsoft-ds", "smb"],
        3306 => &["mysql", "mariadb"],
        3389 => &["ms-wbt", "rdp", "terminal"],
        5432 => &["postgres"],
        8080 => &["http", "proxy"],
        _ => &[],
    }
}

/// Flags suspicious exposures in a host→open-TCP-ports map.
///
/// `service_hints` is host→port→service-name, typically from the external
/// enrichment tool; without it only the port-number heuristic applies.
/// Findings come back ordered by host, then port.
pub fn detect_anomalies(
    open_ports: &HashMap<IpAddr, Vec<u16>>,
    service_hints: Option<&HashMap<IpAddr, HashMap<u16, String>>>,
) -> Vec<AnomalyFinding> {
    let mut findings: Vec<AnomalyFinding> = Vec::new();

    for (addr, ports) in open_ports {
        for &port in ports {
            let service: Option<&str> = service_hints
                .and_then(|hints| hints.get(addr))
                .and_then(|by_port| by_port.get(&port))
                .map(String::as_str);

            if let Some(finding) = classify(*addr, port, service) {
                findings.push(finding);
            }
        }
    }

    findings.sort_by(|a, b| (a.addr, a.port).cmp(&(b.addr, b.port)));
    findings
}

fn classify(addr: IpAddr, port: u16, service: Option<&str>) -> Option<AnomalyFinding> {
    if let Some(name) = service {
        if is_suspicious_service(name) {
            return Some(AnomalyFinding {
                addr,
                port,
                severity: Severity::High,
                reason: format!("Suspicious service '{name}' on port {port}"),
            });
        }

        if is_port_anomaly(port, name) {
            return Some(AnomalyFinding {
                addr,
                port,
                severity: Severity::High,
                reason: format!(
                    "Service '{name}' does not match the conventional service for port {port}"
                ),
            });
        }
    }

    if port >= EPHEMERAL_PORT_FLOOR {
        return Some(AnomalyFinding {
            addr,
            port,
            severity: Severity::Medium,
            reason: format!("Listening service on ephemeral port {port}"),
        });
    }

    None
}

fn is_suspicious_service(name: &str) -> bool {
    let lname: String = name.to_lowercase();
    SUSPICIOUS_SERVICE_KEYWORDS
        .iter()
        .any(|keyword| lname.contains(keyword))
}

fn is_port_anomaly(port: u16, service: &str) -> bool {
    let expected: &[&str] = expected_services(port);
    if expected.is_empty() || service.is_empty() {
        return false;
    }

    let lservice: String = service.to_lowercase();
    !expected.iter().any(|keyword| lservice.contains(keyword))
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
    use std::net::Ipv4Addr;

    fn host(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    fn ports(addr: IpAddr, list: &[u16]) -> HashMap<IpAddr, Vec<u16>> {
        HashMap::from([(addr, list.to_vec())])
    }

    fn hints(addr: IpAddr, port: u16, name: &str) -> HashMap<IpAddr, HashMap<u16, String>> {
        HashMap::from([(addr, HashMap::from([(port, name.to_string())]))])
    }

    #[test]
    fn ephemeral_listener_is_medium() {
        let findings = detect_anomalies(&ports(host(1), &[50_000]), None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[0].port, 50_000);
    }

    #[test]
    fn suspicious_service_name_is_high() {
        let h = hints(host(1), 80, "backdoor");
        let findings = detect_anomalies(&ports(host(1), &[80]), Some(&h));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].reason.contains("Suspicious service"));
    }

    #[test]
    fn mismatched_conventional_service_is_high() {
        let h = hints(host(1), 22, "apache httpd");
        let findings = detect_anomalies(&ports(host(1), &[22]), Some(&h));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert!(findings[0].reason.contains("port 22"));
    }

    #[test]
    fn conventional_pairs_are_quiet() {
        let h = hints(host(1), 443, "https");
        assert!(detect_anomalies(&ports(host(1), &[443]), Some(&h)).is_empty());
        assert!(detect_anomalies(&ports(host(1), &[22, 80, 8080]), None).is_empty());
    }

    #[test]
    fn findings_are_ordered_and_inputs_untouched() {
        let mut open = ports(host(2), &[50_001]);
        open.insert(host(1), vec![60_000, 50_000]);
        let snapshot = open.clone();

        let findings = detect_anomalies(&open, None);
        assert_eq!(open, snapshot);

        let keys: Vec<(IpAddr, u16)> = findings.iter().map(|f| (f.addr, f.port)).collect();
        assert_eq!(
            keys,
            vec![(host(1), 50_000), (host(1), 60_000), (host(2), 50_001)]
        );
    }

    #[test]
    fn unknown_port_with_benign_name_is_quiet() {
        let h = hints(host(1), 8222, "custom-api");
        assert!(detect_anomalies(&ports(host(1), &[8222]), Some(&h)).is_empty());
    }
}
