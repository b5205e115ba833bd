//! CLI argument parsing definitions

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ttload_core::{parse_date, BurstyService};
use ttload_engine::{ScenarioKind, ScenarioSet};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the load test
    Run {
        /// Gateway host, optionally with scheme and port
        host: String,

        /// First travel date, YYYY-MM-DD
        #[arg(value_parser = parse_base_date)]
        base_date: NaiveDate,

        /// Number of concurrent workers
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        threads: u32,

        /// How long to run, in seconds
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        duration_seconds: u64,

        /// Enabled scenarios as 8 characters of 0/1, e.g. 11111111
        #[arg(value_parser = parse_mask)]
        scenario_mask: Option<ScenarioSet>,
    },

    /// Fill the backend with unpaid, paid, collected and consigned orders
    Warmup {
        /// Gateway host, optionally with scheme and port
        host: String,

        /// First travel date, YYYY-MM-DD
        #[arg(value_parser = parse_base_date)]
        base_date: NaiveDate,

        /// Number of concurrent workers
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        threads: u32,
    },

    /// Set the burst parameters of a service
    SetParams {
        host: String,

        /// One of ts-basic-service, ts-cancel-service, ts-seat-service, ts-travel-service
        #[arg(value_parser = parse_service)]
        service: BurstyService,

        burst_period: i64,

        burst_rate: i64,

        burst_duration: i64,
    },

    /// Show the burst parameters of a service
    GetParams {
        host: String,

        #[arg(value_parser = parse_service)]
        service: BurstyService,
    },

    /// Run one scenario once
    Once {
        host: String,

        /// Scenario name, e.g. QueryAndPay
        #[arg(value_parser = parse_scenario)]
        scenario: ScenarioKind,

        /// Travel date, YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = parse_base_date)]
        base_date: Option<NaiveDate>,
    },

    /// Check that the auxiliary and admin services answer
    Probe { host: String },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate a sample configuration file
    Generate {
        /// Output file path (prints to stdout when omitted)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        config_file: PathBuf,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

fn parse_base_date(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn parse_mask(value: &str) -> Result<ScenarioSet, String> {
    ScenarioSet::from_mask(value).map_err(|e| e.to_string())
}

fn parse_scenario(value: &str) -> Result<ScenarioKind, String> {
    value.parse().map_err(|e: ttload_engine::EngineError| {
        let known: Vec<&str> = ScenarioKind::all().iter().map(|kind| kind.name()).collect();
        format!("{}. Known scenarios: {}", e, known.join(", "))
    })
}

fn parse_service(value: &str) -> Result<BurstyService, String> {
    value.parse().map_err(|e: ttload_core::CoreError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "ttload", "run", "10.0.0.5", "2024-09-29", "8", "600", "10100001",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                host,
                base_date,
                threads,
                duration_seconds,
                scenario_mask,
            } => {
                assert_eq!(host, "10.0.0.5");
                assert_eq!(base_date, NaiveDate::from_ymd_opt(2024, 9, 29).unwrap());
                assert_eq!(threads, 8);
                assert_eq!(duration_seconds, 600);
                assert_eq!(scenario_mask.unwrap().to_mask(), "10100001");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_mask_is_optional() {
        let cli = Cli::try_parse_from(["ttload", "--json", "run", "host", "2024-09-29", "1", "5"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Run {
                scenario_mask: None,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        let bad = [
            vec!["ttload", "run", "host", "29-09-2024", "1", "5"],
            vec!["ttload", "run", "host", "2024-09-29", "0", "5"],
            vec!["ttload", "run", "host", "2024-09-29", "1", "0"],
            vec!["ttload", "run", "host", "2024-09-29", "1", "5", "00000000"],
            vec!["ttload", "run", "host", "2024-09-29", "1", "5", "1111"],
            vec!["ttload", "set-params", "host", "ts-food-service", "1", "2", "3"],
            vec!["ttload", "once", "host", "QueryAndFly"],
        ];

        for args in bad {
            assert!(Cli::try_parse_from(&args).is_err(), "{:?} parsed", args);
        }
    }

    #[test]
    fn test_set_params_arguments() {
        let cli = Cli::try_parse_from([
            "ttload", "set-params", "host", "ts-seat-service", "60", "5", "10",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::SetParams {
                service: BurstyService::Seat,
                burst_period: 60,
                burst_rate: 5,
                burst_duration: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_once_arguments() {
        let cli = Cli::try_parse_from([
            "ttload", "once", "host", "queryandconsign", "--base-date", "2024-10-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Once {
                scenario, base_date, ..
            } => {
                assert_eq!(scenario, ScenarioKind::QueryAndConsign);
                assert_eq!(base_date, NaiveDate::from_ymd_opt(2024, 10, 1));
            }
            _ => panic!("expected once"),
        }
    }
}
