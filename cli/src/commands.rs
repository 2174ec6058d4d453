pub mod discover;
pub mod sweep;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(about = "An adaptive network discovery engine.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover live hosts and open ports in the given networks
    #[command(alias = "d")]
    Discover(discover::DiscoverArgs),
    /// TCP-sweep the given networks, nothing else
    #[command(alias = "s")]
    Sweep(sweep::SweepArgs),
}

/// Knobs shared by every sweep-driven command.
#[derive(Args)]
pub struct Tuning {
    /// Ports to sweep, e.g. "22,80,443,8000-8100"
    #[arg(long)]
    pub ports: Option<String>,

    /// Per-probe timeout in milliseconds
    #[arg(long, default_value_t = 500)]
    pub timeout_ms: u64,

    /// Starting batch size for the adaptive throttle
    #[arg(long, default_value_t = 500)]
    pub batch: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
