//! TrainTicket client configuration

use std::time::Duration;
use ttload_config::domains::http::HttpConfig as ConfigHttpConfig;
use ttload_config::{TargetConfig, TtloadConfig};
use ttload_resilience::RetryPolicy;

/// Settings for one client session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: u32,

    /// User agent string
    pub user_agent: String,

    /// Whether to verify SSL certificates
    pub verify_ssl: bool,

    pub username: String,
    pub password: String,

    /// How long a login token is trusted
    pub token_ttl: Duration,

    /// Retry policy for ticket cancellation
    pub cancel_retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for ClientConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        let target = TargetConfig::default();
        Self {
            timeout: config.timeout,
            max_redirects: config.max_redirects,
            user_agent: config.user_agent,
            verify_ssl: config.verify_ssl,
            username: target.username,
            password: target.password,
            token_ttl: target.token_ttl,
            cancel_retry: RetryPolicy::linear(config.cancel_max_attempts, config.cancel_retry_delay),
        }
    }
}

impl From<&TtloadConfig> for ClientConfig {
    fn from(config: &TtloadConfig) -> Self {
        let mut client = ClientConfig::from(config.http.clone());
        client.username = config.target.username.clone();
        client.password = config.target.password.clone();
        client.token_ttl = config.target.token_ttl;
        client
    }
}

impl ClientConfig {
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}
