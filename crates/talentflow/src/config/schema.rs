//! Configuration data model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gdpr::RetentionPolicy;

fn default_version() -> String {
    "1.0".to_string()
}

fn default_guarantee_days() -> i64 {
    90
}

/// Application configuration.
///
/// Every field has a default, so embedders that never ship a config file
/// can use `Config::default()` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,

    /// Override for the SQLite database location. When absent the
    /// canonical path under the user's home directory is used.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Retention thresholds for GDPR classification.
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Default guarantee period offered in placement forms. The
    /// transition validator still requires the explicit field.
    #[serde(default = "default_guarantee_days")]
    pub guarantee_default_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: None,
            retention: RetentionPolicy::default(),
            guarantee_default_days: default_guarantee_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_retention_defaults() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.retention.stale_from_days, 183);
        assert_eq!(config.retention.at_risk_from_days, 366);
        assert_eq!(config.retention.horizon_days, 730);
        assert_eq!(config.guarantee_default_days, 90);
        assert!(config.database_path.is_none());
    }
}
