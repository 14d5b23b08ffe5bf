mod cli;
mod core;
mod terminal;

use clap::Parser;
use cli::{Cli, Commands};
use crate::core::models::DataPath;
use std::io;

async fn run(cli: Cli) -> io::Result<()> {
    let data_path = DataPath::new(cli.data_path)?;

    match &cli.command {
        Commands::Watch { platform, endpoint } => {
            cli::handle_watch_command(&data_path, *platform, endpoint).await
        }
        Commands::Check { platform, endpoint } => {
            cli::handle_check_command(&data_path, *platform, endpoint).await
        }
        Commands::Locations => {
            cli::handle_locations_command();
            Ok(())
        }
        Commands::Config { command } => cli::handle_config_command(&data_path, command),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
