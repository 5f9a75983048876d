//! Layered host configuration: YAML file, then `AUTHGATE_*` environment.

use std::path::Path;

use anyhow::{Context, bail};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use token_validator::KeyRegistryConfig;

/// Prefix for environment overrides, e.g. `AUTHGATE_KEYS__ISSUER`.
pub const ENV_PREFIX: &str = "AUTHGATE_";

/// Host configuration.
///
/// ```yaml
/// keys:
///   issuer: "https://auth.example.com"
///   audience: "orders-api"
///   clock_skew: "2m"
///   keys:
///     - key_id: "2025-q1"
///       secret: "c2VjcmV0LWtleS1tYXRlcmlhbC0wMQ=="
/// logging:
///   level: "info"
///   format: json
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub keys: KeyRegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    /// Load configuration from an optional YAML file with environment
    /// overrides on top.
    ///
    /// # Errors
    ///
    /// Fails if `path` does not exist or the merged configuration does not
    /// deserialize.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert!(cfg.keys.keys.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/authgate.yaml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
