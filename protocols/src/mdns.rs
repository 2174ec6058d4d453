//! mDNS service-enumeration query and reply decoding.
//!
//! The query asks for `_services._dns-sd._udp.local` (DNS-SD service type
//! enumeration); any responder on the segment that speaks Bonjour/Avahi
//! answers it. Replies are decoded with `dns-parser`.

use std::{collections::HashSet, net::IpAddr};

use anyhow::{Context, Result};
use dns_parser::{Packet, RData};

pub const MDNS_PORT: u16 = 5353;
pub const MDNS_GROUP: std::net::Ipv4Addr = std::net::Ipv4Addr::new(224, 0, 0, 251);

const DNS_HDR_LEN: usize = 12;
const QTYPE_PTR: u16 = 12;
const QCLASS_IN: u16 = 1;
const SERVICES_QUERY_NAME: &str = "_services._dns-sd._udp.local";

#[derive(Debug, Default)]
pub struct MdnsRecord {
    pub hostname: Option<String>,
    pub ips: HashSet<IpAddr>,
}

/// Builds the service-type enumeration query.
///
/// Plain query header (all counts zero except one question), then the
/// label-encoded name, PTR type, IN class. mDNS permits a zero id; a random
/// one makes replies attributable when several probes are in flight.
pub fn build_services_query(id: u16) -> Vec<u8> {
    let qname: Vec<u8> = encode_dns_name(SERVICES_QUERY_NAME);
    let total: usize = DNS_HDR_LEN + qname.len() + 4;
    let mut buffer: Vec<u8> = Vec::with_capacity(total);

    buffer.extend_from_slice(&id.to_be_bytes());
    buffer.extend_from_slice(&[0x00, 0x00]); // flags: standard query
    buffer.extend_from_slice(&[0x00, 0x01]); // questions
    buffer.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    buffer.extend_from_slice(&qname);
    buffer.extend_from_slice(&QTYPE_PTR.to_be_bytes());
    buffer.extend_from_slice(&QCLASS_IN.to_be_bytes());

    buffer
}

/// Fresh query with a random transaction id.
pub fn build_query() -> Vec<u8> {
    build_services_query(rand::random::<u16>())
}

/// Pulls the responder's identity out of an mDNS reply.
pub fn extract_responder(data: &[u8]) -> Result<MdnsRecord> {
    let packet = Packet::parse(data).context("failed to parse mDNS packet")?;
    let mut record: MdnsRecord = MdnsRecord::default();

    for answer in packet.answers.iter().chain(packet.additional.iter()) {
        match &answer.data {
            RData::PTR(ptr) => {
                let name: String = ptr.0.to_string();
                if !name.ends_with(".arpa") {
                    record.hostname = Some(name);
                }
            }

            RData::A(a) => {
                record.ips.insert(IpAddr::V4(a.0));
            }

            RData::AAAA(aaaa) => {
                record.ips.insert(IpAddr::V6(aaaa.0));
            }

            _ => {}
        }
    }

    Ok(record)
}

fn encode_dns_name(name: &str) -> Vec<u8> {
    let mut encoded: Vec<u8> = Vec::new();
    for label in name.split('.') {
        if label.is_empty() {
            continue;
        }
        encoded.push(label.len() as u8);
        encoded.extend_from_slice(label.as_bytes());
    }
    encoded.push(0);
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_embeds_the_services_label() {
        let pkt: Vec<u8> = build_services_query(0);
        assert!(
            pkt.windows(9).any(|w| w == b"_services"),
            "query must carry the _services label"
        );
        // One question, no answers.
        assert_eq!(&pkt[4..6], &[0x00, 0x01]);
        assert_eq!(&pkt[6..8], &[0x00, 0x00]);
        // Trailing type/class: PTR, IN.
        assert_eq!(&pkt[pkt.len() - 4..], &[0x00, 0x0c, 0x00, 0x01]);
    }

    #[test]
    fn query_roundtrips_through_the_parser() {
        let pkt: Vec<u8> = build_services_query(0x1234);
        let parsed = Packet::parse(&pkt).expect("own query must parse");
        assert_eq!(parsed.header.id, 0x1234);
        assert_eq!(parsed.questions.len(), 1);
    }

    #[test]
    fn extract_rejects_truncated_data() {
        assert!(extract_responder(&[0x00, 0x01, 0x02]).is_err());
    }
}
