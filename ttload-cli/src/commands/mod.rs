//! Command handlers

pub mod config;
pub mod load;
pub mod params;
pub mod probe;

use anyhow::{Context, Result};
use std::sync::Arc;
use ttload_config::TtloadConfig;
use ttload_engine::ApiFactory;
use ttload_http::{ApiError, ClientConfig, TicketApi, TrainTicketClient};
use ttload_resilience::StopListener;

pub use config::{config_generate_command, config_show_command, config_validate_command};
pub use load::{once_command, run_command, warmup_command};
pub use params::{get_params_command, set_params_command};
pub use probe::probe_command;

/// `{scheme}://{host}:{port}` for a host given on the command line
fn target_url(config: &TtloadConfig, host: &str) -> Result<String> {
    config
        .target
        .base_url(host)
        .context(format!("Invalid target host: {}", host))
}

/// A client that has not logged in yet
fn connect(config: &TtloadConfig, host: &str) -> Result<TrainTicketClient> {
    let url = target_url(config, host)?;
    TrainTicketClient::new(&url, ClientConfig::from(config))
        .context(format!("Failed to create client for {}", url))
}

/// One fresh client per worker, all aimed at the same gateway
fn client_factory(config: &TtloadConfig, host: &str) -> Result<Arc<dyn ApiFactory>> {
    let url = target_url(config, host)?;
    let client_config = ClientConfig::from(config);

    Ok(Arc::new(
        move |stop: StopListener| -> Result<Arc<dyn TicketApi>, ApiError> {
            let client = TrainTicketClient::new(&url, client_config.clone())?.with_stop(stop);
            Ok(Arc::new(client))
        },
    ))
}

/// Print `value` as pretty JSON
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to format result as JSON")?;
    println!("{}", json);
    Ok(())
}
