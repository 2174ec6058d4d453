use thiserror::Error;

/// Configuration errors surfaced to the caller before any probe is sent.
///
/// Transient network conditions (timeouts, refused connections) are never
/// represented here; sweeps fold those into per-probe outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("invalid network '{input}': {reason}")]
    InvalidNetwork { input: String, reason: String },

    #[error("invalid port spec '{0}'")]
    InvalidPortSpec(String),

    #[error("port 0 is not probeable")]
    PortZero,
}
