use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use txstorm_config::{ConfigLoader, LoggingConfig};
use txstorm_logging::init_logging;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};
use commands::{handle_config_generate, handle_config_validate, handle_run};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            config,
            count,
            workers,
        } => {
            // Logging comes from the file, so load it first
            let loaded = ConfigLoader::new()
                .from_file(config)
                .with_context(|| format!("Failed to load configuration from {:?}", config))?;
            init_logging(&loaded.logging, cli.log_level.as_deref())?;
            info!("txstorm starting");

            let summary = handle_run(&loaded, *count, *workers).await?;
            println!("{}", summary);
            Ok(())
        }
        Commands::Config { config_cmd } => {
            init_logging(&LoggingConfig::default(), cli.log_level.as_deref())?;
            match config_cmd {
                ConfigCommands::Validate { config_file } => handle_config_validate(config_file),
                ConfigCommands::Generate { output, force } => {
                    handle_config_generate(output.as_deref(), *force)
                }
            }
        }
    }
}
