//! Configuration errors

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A `TTLOAD_*` variable did not parse
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// A section holds a value ttload cannot run with
    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
