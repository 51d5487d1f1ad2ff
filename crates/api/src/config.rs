//! Service configuration
//!
//! Layered with the `config` crate: an optional TOML/JSON/YAML file
//! (`heart-service.*`, or the path in `HEART_CONFIG`) overridden by
//! environment variables such as `HEART__SERVER__BIND_ADDR` or
//! `HEART__ENCODING__CATEGORY_POLICY=legacy`.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use feature_engine::CategoryPolicy;
use model_store::ArtifactPaths;
use serde::{Deserialize, Serialize};

/// Default config file stem, extension resolved by `config`
pub const DEFAULT_CONFIG_FILE: &str = "heart-service";

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactPaths,
    pub encoding: EncodingConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub category_policy: CategoryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `["*"]` allows any
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServiceConfig {
    /// Load from `HEART_CONFIG` (or the default file) plus environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HEART_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from a specific file (optional) plus environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("HEART")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.encoding.category_policy, CategoryPolicy::Strict);
        assert_eq!(config.cors.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.artifacts.target_column, "HeartDisease");
        assert!(!config.rate_limit.enabled);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = tmp.path().join("absent");
        let config = ServiceConfig::load_from(path.to_str().unwrap()).expect("load");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_toml_file() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = tmp.path().join("service.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:9000"

[artifacts]
classifier = "/models/heart.onnx"

[encoding]
category_policy = "legacy"

[rate_limit]
enabled = true
burst_size = 20
"#,
        )
        .expect("write config");

        let config = ServiceConfig::load_from(path.to_str().unwrap()).expect("load");
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.artifacts.classifier, PathBuf::from("/models/heart.onnx"));
        assert_eq!(config.artifacts.scaler, PathBuf::from("artifacts/scaler.json"));
        assert_eq!(config.encoding.category_policy, CategoryPolicy::Legacy);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.burst_size, 20);
        assert_eq!(config.rate_limit.per_second, RateLimitConfig::default().per_second);
    }
}
