use anyhow::Result;
use clap::Parser;

use desmata::cli::{Cli, Commands};
use desmata::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Commands::Process(args) => commands::process(&cli, args),
        #[cfg(feature = "download")]
        Commands::Download(args) => commands::download(&cli, args),
    }
}
