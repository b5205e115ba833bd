//! Target deployment configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_enum_choice, validate_port_range, validate_positive, validate_required_string,
    validate_url, Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the TrainTicket gateway lives and which account to drive it with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// URL scheme of the gateway
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Gateway port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user
    #[serde(default = "default_username")]
    pub username: String,

    /// Login password
    #[serde(default = "default_password")]
    pub password: String,

    /// How long a login token is trusted before the session logs in again
    #[serde(with = "humantime_serde", default = "default_token_ttl")]
    pub token_ttl: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl TargetConfig {
    /// Build the gateway base URL for a host.
    ///
    /// A host that already carries a scheme is used as given.
    pub fn base_url(&self, host: &str) -> ConfigResult<String> {
        let host = host.trim().trim_end_matches('/');
        validate_required_string(host, "host", self.domain_name())?;

        let url = if host.contains("://") {
            host.to_string()
        } else {
            format!("{}://{}:{}", self.scheme, host, self.port)
        };

        validate_url(&url, "host", self.domain_name())?;
        Ok(url)
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_enum_choice(&self.scheme, &["http", "https"], "scheme", self.domain_name())?;
        validate_port_range(self.port, "port", self.domain_name())?;
        validate_required_string(&self.username, "username", self.domain_name())?;
        validate_required_string(&self.password, "password", self.domain_name())?;
        validate_positive(self.token_ttl.as_secs(), "token_ttl", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_scheme() -> String {
    "http".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_username() -> String {
    "fdse_microservice".to_string()
}

fn default_password() -> String {
    "111111".to_string()
}

fn default_token_ttl() -> Duration {
    Duration::from_secs(3600)
}
