//! The `config` subcommands

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use txstorm_config::{ConfigLoader, TxStormConfig};

/// Load and validate a configuration file, printing a short summary
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow!("Configuration file not found: {:?}", config_file));
    }

    let config = ConfigLoader::new()
        .from_file(config_file)
        .with_context(|| format!("Configuration validation failed for {:?}", config_file))?;

    println!("Configuration file is valid");
    println!("  channel:   {}", config.channel);
    println!("  chaincode: {} {}", config.chaincode, config.version);
    println!(
        "  endorsers: {} (quorum {})",
        config.endorsers.len(),
        config.quorum_threshold()
    );
    println!("  orderer:   {}", config.orderer.addr);
    println!("  committer: {}", config.committer.addr);
    Ok(())
}

/// Write the sample configuration to `output`, or print it
pub fn handle_config_generate(output: Option<&Path>, force: bool) -> Result<()> {
    let content = TxStormConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", content);
        return Ok(());
    };

    if output.exists() && !force {
        return Err(anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }
    fs::write(output, content).context("Failed to write configuration file")?;

    info!("Generated sample configuration at {:?}", output);
    println!("Configuration generated at: {:?}", output);
    println!("Validate with: txstorm config validate {:?}", output);
    Ok(())
}
