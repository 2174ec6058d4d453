//! Per-port UDP probe payloads.
//!
//! A UDP port only betrays itself when something on it answers, so every
//! probe carries the smallest query the conventional service on that port
//! cannot ignore. Unknown ports get a single null byte; some stacks answer
//! even that.

use crate::{mdns, ssdp};

struct UdpProbe {
    port: u16,
    service: &'static str,
    payload: &'static [u8],
}

const UDP_PROBES: &[UdpProbe] = &[
    // DNS version.bind TXT CH query
    UdpProbe {
        port: 53,
        service: "dns",
        payload: &[
            0x00, 0x01, // transaction id
            0x01, 0x00, // flags: standard query
            0x00, 0x01, // questions
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // answer/authority/additional
            0x07, b'v', b'e', b'r', b's', b'i', b'o', b'n', // "version"
            0x04, b'b', b'i', b'n', b'd', // "bind"
            0x00, // root
            0x00, 0x10, // type: TXT
            0x00, 0x03, // class: CH
        ],
    },
    // NTP v3 client request
    UdpProbe {
        port: 123,
        service: "ntp",
        payload: &[
            0x1b, 0x00, 0x00, 0x00, // LI/VN/Mode, stratum, poll, precision
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // root delay/dispersion
            0x00, 0x00, 0x00, 0x00, // reference id
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // reference ts
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // originate ts
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // receive ts
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // transmit ts
        ],
    },
    // NetBIOS NBSTAT wildcard query
    UdpProbe {
        port: 137,
        service: "netbios",
        payload: &[
            0x80, 0x94, // transaction id
            0x00, 0x00, // flags
            0x00, 0x01, // questions
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // answer/authority/additional
            0x20, // encoded name length
            b'C', b'K', b'A', b'A', b'A', b'A', b'A', b'A', // encoded "*"
            b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A',
            b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A', b'A',
            0x00, // terminator
            0x00, 0x21, // type: NBSTAT
            0x00, 0x01, // class: IN
        ],
    },
    // SNMPv1 GetRequest, community "public", OID 1.3.6.1.2.1
    UdpProbe {
        port: 161,
        service: "snmp",
        payload: &[
            0x30, 0x26, // SEQUENCE
            0x02, 0x01, 0x00, // version: 1
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', // community
            0xa0, 0x19, // GetRequest PDU
            0x02, 0x04, 0x00, 0x00, 0x00, 0x01, // request id
            0x02, 0x01, 0x00, // error status
            0x02, 0x01, 0x00, // error index
            0x30, 0x0b, // varbind list
            0x30, 0x09, // varbind
            0x06, 0x05, 0x2b, 0x06, 0x01, 0x02, 0x01, // OID
            0x05, 0x00, // NULL
        ],
    },
];

const DEFAULT_PROBE: &[u8] = &[0x00];

/// The payload sent when probing `port`.
pub fn probe_for_port(port: u16) -> Vec<u8> {
    match port {
        ssdp::SSDP_PORT => ssdp::build_msearch(),
        mdns::MDNS_PORT => mdns::build_query(),
        _ => UDP_PROBES
            .iter()
            .find(|p| p.port == port)
            .map(|p| p.payload.to_vec())
            .unwrap_or_else(|| DEFAULT_PROBE.to_vec()),
    }
}

/// The conventional service for a discovery port, if it is one we probe
/// with a real query.
pub fn service_for_port(port: u16) -> Option<&'static str> {
    match port {
        ssdp::SSDP_PORT => Some("ssdp"),
        mdns::MDNS_PORT => Some("mdns"),
        _ => UDP_PROBES.iter().find(|p| p.port == port).map(|p| p.service),
    }
}

/// The default UDP sweep port set: every port we hold a real payload for.
pub fn discovery_ports() -> Vec<u16> {
    let mut ports: Vec<u16> = UDP_PROBES.iter().map(|p| p.port).collect();
    ports.push(ssdp::SSDP_PORT);
    ports.push(mdns::MDNS_PORT);
    ports.sort_unstable();
    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ports_get_real_payloads() {
        assert_eq!(probe_for_port(53).len(), 30);
        assert_eq!(probe_for_port(123).len(), 48);
        assert!(probe_for_port(1900).starts_with(b"M-SEARCH"));
        assert_eq!(probe_for_port(40000), DEFAULT_PROBE.to_vec());
    }

    #[test]
    fn service_names_line_up() {
        assert_eq!(service_for_port(161), Some("snmp"));
        assert_eq!(service_for_port(5353), Some("mdns"));
        assert_eq!(service_for_port(40000), None);
    }

    #[test]
    fn discovery_ports_are_sorted_and_complete() {
        let ports = discovery_ports();
        assert_eq!(ports, vec![53, 123, 137, 161, 1900, 5353]);
    }
}
