//! Configuration management commands

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{error, info};
use ttload_config::{ConfigLoader, TtloadConfig};

pub fn config_generate_command(output: Option<&Path>, force: bool) -> Result<()> {
    let content = TtloadConfig::generate_sample();

    let Some(output) = output else {
        print!("{}", content);
        return Ok(());
    };

    info!("Generating configuration at: {:?}", output);
    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(output, content).context("Failed to write configuration file")?;

    println!("✅ Configuration generated at: {:?}", output);
    println!("🔧 Validate with: ttload config validate {:?}", output);
    Ok(())
}

pub fn config_validate_command(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("✅ Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e).context("Invalid configuration")
        }
    }
}

pub fn config_show_command(config: &TtloadConfig, format: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(config).context("Failed to serialize to YAML")?;
            print!("{}", yaml);
        }
        "json" => {
            let json = serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generated_config_validates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ttload.yaml");

        config_generate_command(Some(&path), false).unwrap();
        assert!(path.exists());
        config_validate_command(&path).unwrap();

        // Refuses to overwrite without --force
        assert!(config_generate_command(Some(&path), false).is_err());
        config_generate_command(Some(&path), true).unwrap();
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = tempdir().unwrap();
        assert!(config_validate_command(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_show_rejects_unknown_format() {
        assert!(config_show_command(&TtloadConfig::default(), "toml").is_err());
        assert!(config_show_command(&TtloadConfig::default(), "json").is_ok());
    }
}
