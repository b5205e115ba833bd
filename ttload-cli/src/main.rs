//! ttload CLI main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use ttload_config::{ConfigLoader, TtloadConfig};
use ttload_core::BurstParams;
use ttload_logging::init_logging_from_config;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<TtloadConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let _logging = init_logging_from_config(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")?;

    info!("ttload {} starting", env!("CARGO_PKG_VERSION"));
    debug!(
        "Target port {}, high-speed weight {}%",
        config.target.port, config.load.high_speed_weight
    );

    match cli.command {
        Commands::Run {
            host,
            base_date,
            threads,
            duration_seconds,
            scenario_mask,
        } => {
            commands::run_command(
                &config,
                &host,
                base_date,
                threads,
                duration_seconds,
                scenario_mask,
                cli.json,
            )
            .await
        }
        Commands::Warmup {
            host,
            base_date,
            threads,
        } => commands::warmup_command(&config, &host, base_date, threads, cli.json).await,
        Commands::SetParams {
            host,
            service,
            burst_period,
            burst_rate,
            burst_duration,
        } => {
            let params = BurstParams {
                period: burst_period,
                rate: burst_rate,
                duration: burst_duration,
            };
            commands::set_params_command(&config, &host, service, params).await
        }
        Commands::GetParams { host, service } => {
            commands::get_params_command(&config, &host, service, cli.json).await
        }
        Commands::Once {
            host,
            scenario,
            base_date,
        } => commands::once_command(&config, &host, scenario, base_date, cli.json).await,
        Commands::Probe { host } => commands::probe_command(&config, &host, cli.json).await,
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Generate { output, force } => {
                commands::config_generate_command(output.as_deref(), force)
            }
            ConfigCommands::Validate { config_file } => commands::config_validate_command(&config_file),
            ConfigCommands::Show { format } => commands::config_show_command(&config, &format),
        },
    }
}
