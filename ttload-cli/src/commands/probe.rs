//! Probe of the read-only and admin endpoints

use super::{connect, print_json};
use anyhow::Result;
use chrono::Local;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;
use ttload_config::TtloadConfig;
use ttload_core::{AdvancedSearch, TrainKind};
use ttload_http::{ApiError, TicketApi};

#[derive(Debug, Serialize)]
struct ProbeResult {
    endpoint: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProbeResult {
    fn new(endpoint: impl Into<String>, result: Result<Option<usize>, ApiError>) -> Self {
        let endpoint = endpoint.into();
        match result {
            Ok(items) => Self {
                endpoint,
                ok: true,
                items,
                error: None,
            },
            Err(e) => Self {
                endpoint,
                ok: false,
                items: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Number of entries when the payload is a list
fn item_count(value: &JsonValue) -> Option<usize> {
    value.as_array().map(Vec::len)
}

pub async fn probe_command(config: &TtloadConfig, host: &str, json: bool) -> Result<()> {
    let client = connect(config, host)?;
    let today = Local::now().date_naive();
    let kind = TrainKind::HighSpeed;
    let route = kind.default_route();

    // Probes work without a token too; the admin services may refuse them
    if let Err(e) = client.login().await {
        warn!("Probing without a session: {}", e);
    }

    let mut results = Vec::new();

    let trips = client.query_trips(kind, &route, today).await;
    let first_trip = trips
        .as_ref()
        .ok()
        .and_then(|search| search.trip_ids.first().cloned());
    results.push(ProbeResult::new(
        "trips/left",
        trips.map(|search| Some(search.trip_ids.len())),
    ));
    results.push(ProbeResult::new(
        "trips/left_parallel",
        client
            .query_trips_parallel(&route, today)
            .await
            .map(|trips| Some(trips.len())),
    ));
    for search in [
        AdvancedSearch::Quickest,
        AdvancedSearch::Cheapest,
        AdvancedSearch::MinStation,
    ] {
        results.push(ProbeResult::new(
            search.path().rsplit('/').next().unwrap_or("travelPlan"),
            client
                .query_advanced(search, &route, today)
                .await
                .map(|plans| Some(plans.len())),
        ));
    }

    if let Some(trip) = first_trip {
        results.push(ProbeResult::new(
            format!("foods ({})", trip),
            client
                .query_food(&route, &trip, today)
                .await
                .map(|food| item_count(&food)),
        ));
    }

    results.push(ProbeResult::new(
        "routes",
        client.query_route(None).await.map(|routes| item_count(&routes)),
    ));
    results.push(ProbeResult::new(
        "assurances/types",
        client.query_assurances().await.map(|types| item_count(&types)),
    ));
    results.push(ProbeResult::new(
        "admintravel",
        client.query_admin_travel().await.map(|trips| item_count(&trips)),
    ));
    results.push(ProbeResult::new(
        "adminbasic/prices",
        client.query_admin_prices().await.map(|prices| item_count(&prices)),
    ));
    results.push(ProbeResult::new(
        "adminbasic/configs",
        client.query_admin_configs().await.map(|configs| item_count(&configs)),
    ));

    if json {
        return print_json(&results);
    }

    println!("Probing {}", client.base_url());
    for result in &results {
        let status = if result.ok { "✓".green() } else { "✗".red() };
        let detail = match (&result.items, &result.error) {
            (_, Some(error)) => error.clone(),
            (Some(items), None) => format!("{} items", items),
            (None, None) => "ok".to_string(),
        };
        println!("  {} {:<24} {}", status, result.endpoint, detail);
    }

    let failed = results.iter().filter(|result| !result.ok).count();
    if failed > 0 {
        println!("\n{}", format!("{} of {} probes failed", failed, results.len()).red());
    }
    Ok(())
}
