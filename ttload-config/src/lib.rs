//! Domain-driven configuration management for ttload
//!
//! Configuration is split by functional domain (target, load, warm-up, HTTP,
//! logging). Each domain validates itself and can be overridden from
//! `TTLOAD_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    http::HttpConfig, load::LoadConfig, logging::LoggingConfig, target::TargetConfig,
    warmup::WarmupConfig, TtloadConfig,
};
