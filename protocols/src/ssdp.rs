//! SSDP discovery (`M-SEARCH`) framing.

use std::net::Ipv4Addr;

pub const SSDP_PORT: u16 = 1900;
pub const SSDP_GROUP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// The `ssdp:all` search request, framed exactly as UPnP devices expect it.
/// CRLF line endings and the quoted MAN value are mandatory; devices drop
/// anything else on the floor without a reply.
pub const M_SEARCH: &[u8] = b"M-SEARCH * HTTP/1.1\r\n\
Host: 239.255.255.250:1900\r\n\
MAN: \"ssdp:discover\"\r\n\
MX: 1\r\n\
ST: ssdp:all\r\n\r\n";

pub fn build_msearch() -> Vec<u8> {
    M_SEARCH.to_vec()
}

/// A unicast `HTTP/1.1 200 OK` is the only positive SSDP answer.
pub fn is_search_response(data: &[u8]) -> bool {
    data.starts_with(b"HTTP/1.1 200")
}
