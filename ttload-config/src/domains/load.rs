//! Load test configuration

use crate::error::ConfigResult;
use crate::validation::{validate_percentage, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the load-test workers and the order cache refresher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Percent chance a scenario targets high-speed trains
    #[serde(default = "default_high_speed_weight")]
    pub high_speed_weight: u32,

    /// Travel dates are drawn from `base_date + 0..date_spread_days`
    #[serde(default = "default_date_spread_days")]
    pub date_spread_days: u32,

    /// Minimum pause between two cache refreshes
    #[serde(with = "humantime_serde", default = "default_refresh_interval")]
    pub refresh_interval: Duration,

    /// Random extra pause added on top of `refresh_interval`
    #[serde(with = "humantime_serde", default = "default_refresh_jitter")]
    pub refresh_jitter: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            high_speed_weight: default_high_speed_weight(),
            date_spread_days: default_date_spread_days(),
            refresh_interval: default_refresh_interval(),
            refresh_jitter: default_refresh_jitter(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_percentage(self.high_speed_weight, "high_speed_weight", self.domain_name())?;
        validate_positive(self.date_spread_days, "date_spread_days", self.domain_name())?;
        validate_positive(
            self.refresh_interval.as_secs(),
            "refresh_interval",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

// Default value functions
fn default_high_speed_weight() -> u32 {
    60
}

fn default_date_spread_days() -> u32 {
    30
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(20)
}

fn default_refresh_jitter() -> Duration {
    Duration::from_secs(10)
}
