//! Warm-up configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Order quotas and pacing for the warm-up phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    #[serde(default = "default_unpaid_target")]
    pub unpaid_target: u32,

    #[serde(default = "default_paid_target")]
    pub paid_target: u32,

    #[serde(default = "default_collected_target")]
    pub collected_target: u32,

    #[serde(default = "default_consigned_target")]
    pub consigned_target: u32,

    /// Login attempts per warm-up worker
    #[serde(default = "default_login_attempts")]
    pub login_attempts: u32,

    /// Base delay between login attempts, grows linearly
    #[serde(with = "humantime_serde", default = "default_login_retry_delay")]
    pub login_retry_delay: Duration,

    /// Pause after an order could not be created
    #[serde(with = "humantime_serde", default = "default_failure_pause")]
    pub failure_pause: Duration,

    /// Wait between two steps of an order (book then pay, pay then collect)
    #[serde(with = "humantime_serde", default = "default_settle_delay")]
    pub settle_delay: Duration,
}

impl WarmupConfig {
    pub fn total_target(&self) -> u32 {
        self.unpaid_target + self.paid_target + self.collected_target + self.consigned_target
    }
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            unpaid_target: default_unpaid_target(),
            paid_target: default_paid_target(),
            collected_target: default_collected_target(),
            consigned_target: default_consigned_target(),
            login_attempts: default_login_attempts(),
            login_retry_delay: default_login_retry_delay(),
            failure_pause: default_failure_pause(),
            settle_delay: default_settle_delay(),
        }
    }
}

impl Validatable for WarmupConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.login_attempts, "login_attempts", self.domain_name())?;

        if self.total_target() == 0 {
            return Err(self.validation_error("at least one order quota must be non-zero"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "warmup"
    }
}

// Default value functions
fn default_unpaid_target() -> u32 {
    1000
}

fn default_paid_target() -> u32 {
    500
}

fn default_collected_target() -> u32 {
    500
}

fn default_consigned_target() -> u32 {
    500
}

fn default_login_attempts() -> u32 {
    3
}

fn default_login_retry_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_failure_pause() -> Duration {
    Duration::from_millis(100)
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(200)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_defaults() {
        let config = WarmupConfig::default();
        assert_eq!(config.unpaid_target, 1000);
        assert_eq!(config.paid_target, 500);
        assert_eq!(config.total_target(), 2500);
        assert_eq!(config.failure_pause, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_warmup_rejects_empty_quotas() {
        let config = WarmupConfig {
            unpaid_target: 0,
            paid_target: 0,
            collected_target: 0,
            consigned_target: 0,
            ..WarmupConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_warmup_durations_from_yaml() {
        let config: WarmupConfig = serde_yaml::from_str("failure_pause: 250ms\n").unwrap();
        assert_eq!(config.failure_pause, Duration::from_millis(250));
        assert_eq!(config.settle_delay, Duration::from_millis(200));
    }
}
