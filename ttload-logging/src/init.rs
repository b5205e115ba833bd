use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use ttload_config::domains::logging::{LogFormat, LogRotation, LogTarget};
use ttload_config::LoggingConfig;

/// A formatted, filtered layer over the registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

// HTTP stack internals are noisy at debug level
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Keeps the background writers of file targets alive.
///
/// Dropping it flushes and closes the log files.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Build an env filter from a level or directive string.
///
/// Falls back to `RUST_LOG`, then to `info`, when the string does not parse.
pub fn build_filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Explicit per-crate directives are left alone
    if !level.contains('=') {
        for directive in QUIET_DEPENDENCIES {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = build_filter(log_level);

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Build one layer per configured target.
///
/// `level_override` (from the command line) wins over every level in the
/// configuration.
pub fn build_layers(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<(Vec<BoxedLayer>, LoggingGuard)> {
    let mut layers = Vec::with_capacity(config.targets.len());
    let mut guards = Vec::new();

    for target in &config.targets {
        let filter = build_filter(&effective_level(
            config,
            target.level().map(|l| l.as_str()),
            level_override,
        ));

        let layer = match target {
            LogTarget::Console { .. } => {
                formatted_layer(config.format, std::io::stderr, true, config.include_location, filter)
            }
            LogTarget::File { path, rotation, .. } => {
                let (writer, guard) = tracing_appender::non_blocking(file_appender(path, *rotation)?);
                guards.push(guard);
                formatted_layer(config.format, writer, false, config.include_location, filter)
            }
        };
        layers.push(layer);
    }

    Ok((layers, LoggingGuard { _guards: guards }))
}

/// Initialize the global subscriber from configuration
pub fn init_logging_from_config(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<LoggingGuard> {
    if config.targets.is_empty() {
        let level = effective_level(config, None, level_override);
        init_simple_tracing(&level)?;
        return Ok(LoggingGuard { _guards: Vec::new() });
    }

    let (layers, guard) = build_layers(config, level_override)?;

    if tracing_subscriber::registry().with(layers).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(guard)
}

fn effective_level(
    config: &LoggingConfig,
    target_level: Option<&str>,
    level_override: Option<&str>,
) -> String {
    level_override
        .or(target_level)
        .unwrap_or(config.level.as_str())
        .to_string()
}

fn formatted_layer<W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
    include_location: bool,
    filter: EnvFilter,
) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(include_location)
        .with_line_number(include_location);

    match format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        LogFormat::Text => layer.with_filter(filter).boxed(),
    }
}

fn file_appender(path: &str, rotation: LogRotation) -> Result<RollingFileAppender> {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("log file path '{}' has no file name", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;

    let rotation = match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };

    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_name)
        .build(directory)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttload_config::domains::logging::LogLevel;

    #[test]
    fn test_effective_level_precedence() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..LoggingConfig::default()
        };

        assert_eq!(effective_level(&config, None, None), "warn");
        assert_eq!(effective_level(&config, Some("error"), None), "error");
        assert_eq!(effective_level(&config, Some("error"), Some("trace")), "trace");
    }

    #[test]
    fn test_build_filter_keeps_explicit_directives() {
        let filter = build_filter("ttload_engine=debug");
        assert!(filter.to_string().contains("ttload_engine=debug"));
        assert!(!filter.to_string().contains("hyper=warn"));

        let filter = build_filter("debug");
        assert!(filter.to_string().contains("hyper=warn"));
    }

    #[test]
    fn test_file_appender_requires_file_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_appender(dir.path().join("run.log").to_str().unwrap(), LogRotation::Never).is_ok());
        assert!(file_appender("/", LogRotation::Never).is_err());
    }
}
