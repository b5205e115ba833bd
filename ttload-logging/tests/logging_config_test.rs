use tracing_subscriber::layer::SubscriberExt;
use ttload_config::domains::logging::{LogFormat, LogLevel, LogRotation, LogTarget};
use ttload_logging::{build_layers, LoggingConfig};

fn file_config(path: &str, format: LogFormat) -> LoggingConfig {
    LoggingConfig {
        level: LogLevel::Info,
        format,
        targets: vec![LogTarget::File {
            path: path.to_string(),
            level: None,
            rotation: LogRotation::Never,
        }],
        include_location: false,
    }
}

#[test]
fn test_file_target_receives_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ttload.log");
    let config = file_config(path.to_str().unwrap(), LogFormat::Text);

    let (layers, guard) = build_layers(&config, None).unwrap();
    let subscriber = tracing_subscriber::registry().with(layers);

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(worker_id = 3, "worker logged in");
        tracing::debug!("filtered out at info level");
    });
    drop(guard);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("worker logged in"));
    assert!(contents.contains("worker_id=3"));
    assert!(!contents.contains("filtered out"));
}

#[test]
fn test_json_format_and_level_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ttload.json");
    let config = file_config(path.to_str().unwrap(), LogFormat::Json);

    let (layers, guard) = build_layers(&config, Some("debug")).unwrap();
    let subscriber = tracing_subscriber::registry().with(layers);

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(scenario = "QueryAndPay", "scenario finished");
    });
    drop(guard);

    let contents = std::fs::read_to_string(&path).unwrap();
    let line = contents.lines().next().unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["level"], "DEBUG");
    assert_eq!(event["fields"]["scenario"], "QueryAndPay");
}

#[test]
fn test_default_config_builds_console_layer() {
    let (layers, _guard) = build_layers(&LoggingConfig::default(), None).unwrap();
    assert_eq!(layers.len(), 1);
}
