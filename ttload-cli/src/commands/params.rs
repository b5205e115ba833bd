//! Burst parameter commands

use super::{connect, print_json};
use anyhow::{Context, Result};
use colored::Colorize;
use ttload_config::TtloadConfig;
use ttload_core::{BurstParams, BurstyService};
use ttload_http::{TicketApi, TrainTicketClient};

pub async fn set_params_command(
    config: &TtloadConfig,
    host: &str,
    service: BurstyService,
    params: BurstParams,
) -> Result<()> {
    let client = logged_in(config, host).await?;
    client
        .set_burst_params(service, params)
        .await
        .context(format!("Failed to set burst parameters of {}", service))?;

    println!(
        "{} {}: period {}, rate {}, duration {}",
        "✓ Burst parameters set for".green(),
        service,
        params.period,
        params.rate,
        params.duration
    );
    Ok(())
}

pub async fn get_params_command(
    config: &TtloadConfig,
    host: &str,
    service: BurstyService,
    json: bool,
) -> Result<()> {
    let client = logged_in(config, host).await?;
    let body = client
        .get_burst_params(service)
        .await
        .context(format!("Failed to get burst parameters of {}", service))?;

    if json {
        // Pass JSON bodies through untouched, wrap anything else
        let value = serde_json::from_str::<serde_json::Value>(&body)
            .unwrap_or_else(|_| serde_json::Value::String(body.clone()));
        print_json(&serde_json::json!({ "service": service.as_str(), "params": value }))
    } else {
        println!("{}: {}", service, body.trim());
        Ok(())
    }
}

/// The burst controllers sit behind the gateway login
async fn logged_in(config: &TtloadConfig, host: &str) -> Result<TrainTicketClient> {
    let client = connect(config, host)?;
    client
        .login()
        .await
        .with_context(|| format!("Login as {} failed", config.target.username))?;
    Ok(client)
}
