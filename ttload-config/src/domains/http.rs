//! Settings for the reqwest client each simulated user drives

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; a scenario never outlives its slowest call by more
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    pub max_redirects: u32,

    /// The login endpoint rejects requests that do not look like a browser
    pub user_agent: String,

    pub verify_ssl: bool,

    /// Ticket cancellation is retried on network errors, 5xx and 429
    pub cancel_max_attempts: u32,

    /// First wait between cancellation attempts, grows linearly
    #[serde(with = "humantime_serde")]
    pub cancel_retry_delay: Duration,
}

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36";

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: BROWSER_USER_AGENT.to_string(),
            verify_ssl: true,
            cancel_max_attempts: 3,
            cancel_retry_delay: Duration::from_secs(1),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        let domain = self.domain_name();
        validate_positive(self.timeout.as_millis(), "timeout", domain)?;
        validate_required_string(&self.user_agent, "user_agent", domain)?;
        validate_positive(self.cancel_max_attempts, "cancel_max_attempts", domain)
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert!(config.user_agent.contains("(KHTML, like Gecko)"));
        assert!(config.verify_ssl);
        assert_eq!(config.cancel_max_attempts, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: HttpConfig = serde_yaml::from_str("timeout: 5s\nverify_ssl: false\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.verify_ssl);
        assert_eq!(config.cancel_retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_http_config_validation() {
        let mut config = HttpConfig::default();
        assert!(config.validate().is_ok());

        config.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config = HttpConfig::default();
        config.user_agent = "  ".to_string();
        assert!(config.validate().is_err());

        config = HttpConfig::default();
        config.cancel_max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
