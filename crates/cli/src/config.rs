//! `callbill config`: run configuration helpers.

use std::path::PathBuf;

use clap::Subcommand;

use callbill_recon::RunConfig;

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  callbill config check callbill.toml")]
    Check {
        /// Path to the TOML config file
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Check { file } => cmd_config_check(file),
    }
}

fn cmd_config_check(file: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&file)
        .map_err(|e| CliError::config(format!("cannot read config {}: {e}", file.display())))?;
    let config = RunConfig::from_toml(&text).map_err(CliError::recon)?;

    println!("{}: ok", file.display());
    println!("{}", describe(&config));
    Ok(())
}

/// Effective settings, one per line.
fn describe(config: &RunConfig) -> String {
    let mode = config
        .reconcile
        .mode
        .map(|m| format!("{m:?}"))
        .unwrap_or_else(|| "default".into());
    let timestamp = config
        .output
        .timestamp
        .map(|t| format!("{t:?}"))
        .unwrap_or_else(|| "per flow".into());

    [
        format!("  unit_rate:          {}", config.tariff.unit_rate),
        format!("  surcharge_factor:   {}", config.tariff.surcharge_factor),
        format!("  toll_free_prefixes: {}", config.toll_free_prefixes.join(", ")),
        format!("  success_response:   {}", config.success_response),
        format!("  reconcile.mode:     {mode}"),
        format!(
            "  output.directory:   {}",
            config.output.directory.as_deref().unwrap_or(".")
        ),
        format!("  output.timestamp:   {timestamp}"),
    ]
    .join("\n")
}
