//! Loading configuration from YAML files and `TTLOAD_*` variables

use crate::domains::logging::{LogFormat, LogLevel};
use crate::domains::TtloadConfig;
use crate::error::{ConfigError, ConfigResult};
use humantime_serde::re::humantime;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Reads a config file (or the defaults) and applies environment overrides.
///
/// | variable | field |
/// |----------|-------|
/// | `TARGET_SCHEME`, `TARGET_PORT` | `target.scheme`, `target.port` |
/// | `USERNAME`, `PASSWORD` | `target.username`, `target.password` |
/// | `HIGH_SPEED_WEIGHT`, `REFRESH_INTERVAL` | `load.*` |
/// | `HTTP_TIMEOUT`, `HTTP_USER_AGENT`, `HTTP_VERIFY_SSL` | `http.*` |
/// | `LOG_LEVEL`, `LOG_FORMAT` | `logging.*` |
///
/// Every variable carries the loader prefix, `TTLOAD_` by default. Durations
/// take humantime strings (`20s`, `1m 30s`) or a bare number of seconds.
pub struct ConfigLoader {
    prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_prefix("TTLOAD")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<TtloadConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: TtloadConfig = serde_yaml::from_str(&content)?;
        self.finish(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env(&self) -> ConfigResult<TtloadConfig> {
        self.finish(TtloadConfig::default())
    }

    fn finish(&self, mut config: TtloadConfig) -> ConfigResult<TtloadConfig> {
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut TtloadConfig) -> ConfigResult<()> {
        let env = EnvSource { prefix: &self.prefix };

        if let Some(scheme) = env.string("TARGET_SCHEME") {
            config.target.scheme = scheme;
        }
        if let Some(port) = env.parse("TARGET_PORT")? {
            config.target.port = port;
        }
        if let Some(username) = env.string("USERNAME") {
            config.target.username = username;
        }
        if let Some(password) = env.string("PASSWORD") {
            config.target.password = password;
        }

        if let Some(weight) = env.parse("HIGH_SPEED_WEIGHT")? {
            config.load.high_speed_weight = weight;
        }
        if let Some(interval) = env.duration("REFRESH_INTERVAL")? {
            config.load.refresh_interval = interval;
        }

        if let Some(timeout) = env.duration("HTTP_TIMEOUT")? {
            config.http.timeout = timeout;
        }
        if let Some(user_agent) = env.string("HTTP_USER_AGENT") {
            config.http.user_agent = user_agent;
        }
        if let Some(verify_ssl) = env.parse("HTTP_VERIFY_SSL")? {
            config.http.verify_ssl = verify_ssl;
        }

        if let Some(level) = env.parse::<LogLevel>("LOG_LEVEL")? {
            config.logging.level = level;
        }
        if let Some(format) = env.parse::<LogFormat>("LOG_FORMAT")? {
            config.logging.format = format;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

struct EnvSource<'a> {
    prefix: &'a str,
}

impl EnvSource<'_> {
    fn string(&self, name: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, name)).ok()
    }

    fn parse<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(name)
            .map(|raw| raw.trim().parse().map_err(|e| invalid(name, e)))
            .transpose()
    }

    fn duration(&self, name: &str) -> ConfigResult<Option<Duration>> {
        self.string(name)
            .map(|raw| {
                let raw = raw.trim();
                match raw.parse::<u64>() {
                    Ok(seconds) => Ok(Duration::from_secs(seconds)),
                    Err(_) => humantime::parse_duration(raw).map_err(|e| invalid(name, e)),
                }
            })
            .transpose()
    }
}

fn invalid(name: &str, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::EnvError(format!("Invalid {}: {}", name, error))
}
