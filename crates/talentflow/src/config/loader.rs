use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let compiled =
        jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
            message: format!("Failed to compile JSON schema: {}", e),
        })?;

    let error_messages: Vec<String> = compiled
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let retention = &config.retention;
    if retention.stale_from_days <= 0 {
        return Err(ConfigError::Validation {
            message: "retention.stale_from_days must be positive".to_string(),
        });
    }
    if retention.at_risk_from_days <= retention.stale_from_days {
        return Err(ConfigError::Validation {
            message: "retention.at_risk_from_days must be greater than stale_from_days"
                .to_string(),
        });
    }
    if retention.horizon_days < retention.at_risk_from_days {
        return Err(ConfigError::Validation {
            message: "retention.horizon_days must not be less than at_risk_from_days".to_string(),
        });
    }

    if config.guarantee_default_days < 1 {
        return Err(ConfigError::Validation {
            message: "guarantee_default_days must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database_path": "/var/lib/talentflow/talentflow.db",
            "retention": {
                "stale_from_days": 183,
                "at_risk_from_days": 366,
                "horizon_days": 730
            },
            "guarantee_default_days": 90
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(
            config.database_path.as_deref(),
            Some(std::path::Path::new("/var/lib/talentflow/talentflow.db"))
        );
        assert_eq!(config.retention.horizon_days, 730);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert_eq!(config.retention.stale_from_days, 183);
        assert_eq!(config.guarantee_default_days, 90);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unordered_retention_thresholds() {
        let config_json = r#"
        {
            "version": "1.0",
            "retention": {
                "stale_from_days": 400,
                "at_risk_from_days": 366,
                "horizon_days": 730
            }
        }
        "#;
        let result = load_config_from_str(config_json);
        assert!(result.is_err());
    }

    #[test]
    fn test_horizon_below_at_risk_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "retention": {
                "stale_from_days": 183,
                "at_risk_from_days": 366,
                "horizon_days": 100
            }
        }
        "#;
        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_schema_rejects_wrong_types() {
        let result = load_config_from_str(r#"{ "version": "1.0", "guarantee_default_days": "soon" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_guarantee_days_rejected() {
        let result = load_config_from_str(r#"{ "version": "1.0", "guarantee_default_days": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "version": "1.0" }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, "1.0");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = load_config("/nonexistent/talentflow-config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
