//! # Scan Target Model
//!
//! The raw target input for a discovery run: one or more network ranges in
//! CIDR notation, comma separated on the command line.
//!
//! Parsing here is deliberately shallow. A discovery run must skip a
//! malformed range and record the error rather than refuse to start, so the
//! orchestrator owns CIDR validation; this type only splits and trims.

use std::str::FromStr;

/// One or more network ranges to discover, as given by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Targets(pub Vec<String>);

impl Targets {
    pub fn networks(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Targets {
    type Err = String;

    /// Splits a comma-separated list of CIDR ranges.
    ///
    /// Supported formats:
    /// * **Single**: `192.168.1.0/24`
    /// * **Multiple**: `192.168.1.0/24, 10.0.0.0/16`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let networks: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();

        if networks.is_empty() {
            return Err(format!("no targets in '{s}'"));
        }

        Ok(Targets(networks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_commas_and_trims() {
        let targets = Targets::from_str("192.168.1.0/24, 10.0.0.0/16,,").unwrap();
        assert_eq!(
            targets.networks(),
            &["192.168.1.0/24".to_string(), "10.0.0.0/16".to_string()]
        );
    }

    #[test]
    fn keeps_malformed_entries_for_the_orchestrator() {
        // Validation is the orchestrator's job; the parser passes bad CIDRs
        // through so they can be skipped-and-recorded per range.
        let targets = Targets::from_str("not-a-network").unwrap();
        assert_eq!(targets.networks(), &["not-a-network".to_string()]);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(Targets::from_str("").is_err());
        assert!(Targets::from_str(" , ,").is_err());
    }
}
