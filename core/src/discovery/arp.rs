//! Layer-2 discovery by delegation.
//!
//! ARP resolution at useful fidelity needs raw sockets and privileges on
//! every platform, so this pre-pass shells out to whichever discovery
//! utility is installed instead of reimplementing one. It is the only part
//! of the engine allowed to touch an external binary, and it is strictly
//! best-effort: no tool, a timeout, a crash — all degrade to an empty
//! contribution, never an error.

use std::env;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::result::ArpEntry;

/// One external utility that can enumerate layer-2 neighbours.
#[async_trait]
pub trait ArpBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn discover(&self, network: &str, limit: Duration) -> anyhow::Result<Vec<ArpEntry>>;
}

struct ArpScanTool {
    bin: PathBuf,
}

#[async_trait]
impl ArpBackend for ArpScanTool {
    fn name(&self) -> &'static str {
        "arp-scan"
    }

    async fn discover(&self, network: &str, limit: Duration) -> anyhow::Result<Vec<ArpEntry>> {
        let stdout: String = run_tool(&self.bin, &["-q", network], limit).await?;
        Ok(parse_arp_scan(&stdout))
    }
}

struct NetdiscoverTool {
    bin: PathBuf,
}

#[async_trait]
impl ArpBackend for NetdiscoverTool {
    fn name(&self) -> &'static str {
        "netdiscover"
    }

    async fn discover(&self, network: &str, limit: Duration) -> anyhow::Result<Vec<ArpEntry>> {
        let stdout: String = run_tool(&self.bin, &["-r", network, "-P", "-N"], limit).await?;
        Ok(parse_netdiscover(&stdout))
    }
}

/// Selected when no utility is installed.
struct NoopBackend;

#[async_trait]
impl ArpBackend for NoopBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn discover(&self, _network: &str, _limit: Duration) -> anyhow::Result<Vec<ArpEntry>> {
        Ok(Vec::new())
    }
}

/// Picks the first installed backend: `arp-scan`, then `netdiscover`, then
/// the no-op.
pub fn select_backend() -> Box<dyn ArpBackend> {
    if let Some(bin) = find_in_path("arp-scan") {
        return Box::new(ArpScanTool { bin });
    }
    if let Some(bin) = find_in_path("netdiscover") {
        return Box::new(NetdiscoverTool { bin });
    }
    Box::new(NoopBackend)
}

/// Best-effort ARP pre-pass over one network range.
pub async fn arp_discovery(network: &str, limit: Duration) -> Vec<ArpEntry> {
    let backend: Box<dyn ArpBackend> = select_backend();
    match backend.discover(network, limit).await {
        Ok(entries) => {
            debug!("{} found {} neighbours", backend.name(), entries.len());
            entries
        }
        Err(e) => {
            debug!("{} discovery yielded nothing: {e}", backend.name());
            Vec::new()
        }
    }
}

async fn run_tool(bin: &PathBuf, args: &[&str], limit: Duration) -> anyhow::Result<String> {
    let output = timeout(limit, Command::new(bin).args(args).output())
        .await
        .context("tool timed out")?
        .context("tool failed to run")?;

    let stdout: String = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() && stdout.trim().is_empty() {
        bail!("tool exited with {}", output.status);
    }
    Ok(stdout)
}

/// `arp-scan` rows: `IP<tab>MAC<tab>Vendor text`.
fn parse_arp_scan(stdout: &str) -> Vec<ArpEntry> {
    stdout
        .lines()
        .filter_map(|line| parse_neighbour_line(line, 2))
        .collect()
}

/// `netdiscover -P -N` rows: `IP  MAC  Count  Len  Vendor text`.
fn parse_netdiscover(stdout: &str) -> Vec<ArpEntry> {
    stdout
        .lines()
        .filter_map(|line| parse_neighbour_line(line, 4))
        .collect()
}

fn parse_neighbour_line(line: &str, vendor_from: usize) -> Option<ArpEntry> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let addr: Ipv4Addr = parts.first()?.parse().ok()?;

    let mac: Option<String> = parts
        .get(1)
        .filter(|token| token.contains(':'))
        .map(|token| token.to_string());

    let vendor: Option<String> = if parts.len() > vendor_from {
        Some(parts[vendor_from..].join(" "))
    } else {
        None
    };

    Some(ArpEntry {
        addr: addr.into(),
        mac,
        vendor,
    })
}

/// Resolves a binary name against `PATH`, the precondition for selecting a
/// backend at all.
pub(crate) fn find_in_path(bin: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
