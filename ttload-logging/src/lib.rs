//! Logging setup for ttload
//!
//! Builds a `tracing-subscriber` registry from [`LoggingConfig`]: one layer per
//! configured target, each with its own level filter and the configured
//! output format.

pub mod init;

pub use init::{build_filter, build_layers, init_logging_from_config, init_simple_tracing, LoggingGuard};
pub use ttload_config::LoggingConfig;
