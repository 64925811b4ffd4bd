//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::ban::entry::parse_expiry;
use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a file.
///
/// Files ending in `.json` are read as JSON, everything else as TOML.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    Ok(config)
}

/// Parse and validate a TOML document.
pub fn parse_toml(content: &str) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = toml::from_str(content)?;
    accept(config)
}

/// Parse and validate a JSON document.
pub fn parse_json(content: &str) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = serde_json::from_str(content)?;
    accept(config)
}

fn accept(config: GateConfig) -> Result<GateConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Number of configured bans whose expiry is not RFC3339.
///
/// Loading does not reject these; each one is dropped the first time its
/// address is seen.
pub fn malformed_bans(config: &GateConfig) -> usize {
    config
        .ban_filter
        .bans
        .values()
        .filter(|raw| parse_expiry(raw).is_err())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = parse_toml(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [ban_filter]
            name = "edge"
            enabled = true
            whitelist = ["2.3.4.5"]

            [ban_filter.bans]
            "1.2.3.4" = "2030-01-01T00:00:00Z"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.ban_filter.name, "edge");
        assert_eq!(config.ban_filter.whitelist, vec!["2.3.4.5".to_string()]);
        assert_eq!(config.ban_filter.bans.len(), 1);
    }

    #[test]
    fn test_parse_json() {
        let config = parse_json(
            r#"{
                "ban_filter": {
                    "enabled": true,
                    "bans": { "1.2.3.4": "2030-01-01T00:00:00Z", "9.9.9.9": "soon" }
                }
            }"#,
        )
        .unwrap();

        assert!(config.ban_filter.enabled);
        assert_eq!(config.ban_filter.bans.len(), 2);
        assert_eq!(config.upstream.address, "127.0.0.1:3000");
    }

    #[test]
    fn test_malformed_bans() {
        let config = parse_toml(
            r#"
            [ban_filter.bans]
            "1.2.3.4" = "2030-01-01T00:00:00Z"
            "5.6.7.8" = "2030-01-01"
            "9.9.9.9" = "not-a-timestamp"
            "#,
        )
        .unwrap();

        assert_eq!(malformed_bans(&config), 2);
        assert_eq!(malformed_bans(&GateConfig::default()), 0);
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_toml("[ban_filter\nenabled = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_toml("[timeouts]\nrequest_secs = 0").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::ZeroRequestTimeout]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = std::env::temp_dir();
        let stem = format!("ban_gate_loader_{}", std::process::id());
        let json_path = dir.join(format!("{stem}.json"));
        let toml_path = dir.join(format!("{stem}.toml"));

        fs::write(&json_path, r#"{"ban_filter": {"enabled": true}}"#).unwrap();
        fs::write(&toml_path, "[ban_filter]\nenabled = true\n").unwrap();

        assert!(load_config(&json_path).unwrap().ban_filter.enabled);
        assert!(load_config(&toml_path).unwrap().ban_filter.enabled);

        fs::remove_file(&json_path).unwrap_or_default();
        fs::remove_file(&toml_path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/ban-gate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
