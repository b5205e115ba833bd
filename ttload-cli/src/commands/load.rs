//! Load test, warm-up and single-scenario commands

use super::{client_factory, connect, print_json};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use ttload_config::TtloadConfig;
use ttload_engine::{
    run_single, LoadTest, LoadTestSettings, ScenarioKind, ScenarioOutcome, ScenarioSet, TravelDates, Warmup,
};
use ttload_resilience::StopCoordinator;

/// A stop signal that fires on Ctrl-C
fn interruptible() -> Arc<StopCoordinator> {
    let stop = Arc::new(StopCoordinator::new());
    stop.stop_on_ctrl_c();
    stop
}

pub async fn run_command(
    config: &TtloadConfig,
    host: &str,
    base_date: NaiveDate,
    threads: u32,
    duration_seconds: u64,
    scenarios: Option<ScenarioSet>,
    json: bool,
) -> Result<()> {
    let settings = LoadTestSettings {
        threads: threads as usize,
        duration: Duration::from_secs(duration_seconds),
        base_date,
        scenarios: scenarios.unwrap_or_default(),
        load: config.load.clone(),
    };
    let factory = client_factory(config, host)?;

    let report = LoadTest::new(settings, factory)
        .with_stop(interruptible())
        .run()
        .await
        .context("Load test failed")?;

    if json {
        print_json(&report)
    } else {
        print!("{}", report);
        Ok(())
    }
}

pub async fn warmup_command(
    config: &TtloadConfig,
    host: &str,
    base_date: NaiveDate,
    threads: u32,
    json: bool,
) -> Result<()> {
    let factory = client_factory(config, host)?;
    let dates = TravelDates::new(base_date, config.load.date_spread_days);

    let report = Warmup::new(factory, config.warmup.clone(), dates, threads as usize)
        .with_stop(interruptible())
        .run()
        .await
        .context("Warm-up failed")?;

    if json {
        return print_json(&report);
    }

    print!("{}", report);
    if report.is_complete() {
        println!("\n{}", "✓ All order quotas met".green().bold());
    } else {
        println!("\n{}", "Warm-up stopped before every quota was met".yellow());
    }
    Ok(())
}

pub async fn once_command(
    config: &TtloadConfig,
    host: &str,
    scenario: ScenarioKind,
    base_date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let client = connect(config, host)?;
    let date = base_date.unwrap_or_else(|| Local::now().date_naive());
    info!("Running {} once against {} for {}", scenario, client.base_url(), date);

    let outcome = run_single(Arc::new(client), scenario, date, config.load.high_speed_weight)
        .await
        .context(format!("Failed to prepare {}", scenario))?;

    if json {
        print_json(&serde_json::json!({
            "scenario": scenario.name(),
            "outcome": match &outcome {
                ScenarioOutcome::Completed => "completed",
                ScenarioOutcome::Skipped(_) => "skipped",
                ScenarioOutcome::Failed(_) => "failed",
            },
            "detail": outcome.to_string(),
        }))?;
    } else {
        match &outcome {
            ScenarioOutcome::Completed => println!("{} {}", "✓".green(), scenario),
            ScenarioOutcome::Skipped(reason) => println!("{} {} skipped: {}", "-".yellow(), scenario, reason),
            ScenarioOutcome::Failed(e) => println!("{} {} failed: {}", "✗".red(), scenario, e),
        }
    }

    match outcome {
        ScenarioOutcome::Failed(e) => Err(e).context(format!("{} failed", scenario)),
        _ => Ok(()),
    }
}
