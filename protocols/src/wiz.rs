//! WiZ smart-device discovery.
//!
//! WiZ bulbs and plugs listen on UDP 38899 and answer a `registration`
//! request from anyone on the segment with their MAC and firmware details.
//! The phoneMac/phoneIp fields are what a vendor app would send; devices
//! only echo them back, so placeholders work.

pub const WIZ_PORT: u16 = 38899;

pub const REGISTRATION: &[u8] = br#"{"method":"registration","params":{"phoneMac":"AAAAAAAAAAAA","register":false,"phoneIp":"1.2.3.4","id":"1"}}"#;

pub fn build_registration() -> Vec<u8> {
    REGISTRATION.to_vec()
}

/// Devices answer with `{"method":"registration","result":{...}}`.
pub fn is_registration_response(data: &[u8]) -> bool {
    data.starts_with(b"{") && data.windows(8).any(|w| w == b"\"result\"")
}
