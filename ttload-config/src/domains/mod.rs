//! Domain-specific configuration modules

pub mod http;
pub mod load;
pub mod logging;
pub mod target;
pub mod warmup;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Everything `ttload` reads from its config file.
///
/// Every section is optional; a missing key takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TtloadConfig {
    /// Gateway location and login account
    pub target: target::TargetConfig,
    pub load: load::LoadConfig,
    pub warmup: warmup::WarmupConfig,
    pub http: http::HttpConfig,
    pub logging: logging::LoggingConfig,
}

impl TtloadConfig {
    /// Check every section, stopping at the first invalid one
    pub fn validate_all(&self) -> ConfigResult<()> {
        let sections: [&dyn Validatable; 5] = [&self.target, &self.load, &self.warmup, &self.http, &self.logging];
        sections.iter().try_for_each(|section| section.validate())
    }

    /// The default configuration as plain YAML, for `config generate`
    pub fn generate_sample() -> String {
        serde_yaml::to_string(&TtloadConfig::default())
            .unwrap_or_else(|e| format!("# could not render sample config: {}\n", e))
    }
}
