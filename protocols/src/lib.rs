//! Wire formats for the discovery datagrams.
//!
//! Everything in here must be byte-exact: a malformed discovery payload does
//! not error, it silently discovers nothing.

pub mod mdns;
pub mod payloads;
pub mod ssdp;
pub mod wiz;
