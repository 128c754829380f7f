//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push COUNT transactions through the pipeline and report throughput
    Run {
        /// Path to the configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Number of transactions to generate
        #[arg(value_name = "COUNT")]
        count: u64,

        /// Signer and integrator pool size, overrides the configuration
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(value_name = "CONFIG")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path; printed to stdout when omitted
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "txstorm",
            "run",
            "config.yaml",
            "1000",
            "--workers",
            "4",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run {
                config,
                count,
                workers,
            } => {
                assert_eq!(config, PathBuf::from("config.yaml"));
                assert_eq!(count, 1000);
                assert_eq!(workers, Some(4));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_requires_count() {
        assert!(Cli::try_parse_from(["txstorm", "run", "config.yaml"]).is_err());
        assert!(Cli::try_parse_from(["txstorm", "run", "config.yaml", "many"]).is_err());
    }

    #[test]
    fn test_parse_config_generate() {
        let cli = Cli::try_parse_from(["txstorm", "config", "generate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                config_cmd: ConfigCommands::Generate {
                    output: None,
                    force: false
                }
            }
        ));
    }
}
