mod commands;
mod terminal;

use commands::{CommandLine, Commands, discover, sweep};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init();

    match commands.command {
        Commands::Discover(args) => discover::discover(args).await,
        Commands::Sweep(args) => sweep::sweep(args).await,
    }
}
