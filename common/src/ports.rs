//! Default port sets and port-spec parsing.

use crate::error::ScanError;

/// TCP ports swept when the caller does not supply a list.
///
/// The usual suspects: remote access, mail, name service, web, file
/// sharing, databases and the common alt-HTTP ports.
pub const DEFAULT_TCP_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389, 5900,
    8080, 8443,
];

/// Parses a port spec like `80,443,8000-8010` into a sorted, deduplicated
/// list. Port 0 is rejected; it is not a probeable endpoint.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>, ScanError> {
    let mut ports: Vec<u16> = Vec::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        match part.split_once('-') {
            Some((lo_str, hi_str)) => {
                let lo = parse_one(lo_str)?;
                let hi = parse_one(hi_str)?;
                if lo > hi {
                    return Err(ScanError::InvalidPortSpec(part.to_string()));
                }
                ports.extend(lo..=hi);
            }
            None => ports.push(parse_one(part)?),
        }
    }

    if ports.is_empty() {
        return Err(ScanError::InvalidPortSpec(spec.to_string()));
    }

    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}

fn parse_one(s: &str) -> Result<u16, ScanError> {
    let port: u16 = s
        .trim()
        .parse()
        .map_err(|_| ScanError::InvalidPortSpec(s.to_string()))?;
    if port == 0 {
        return Err(ScanError::PortZero);
    }
    Ok(port)
}
