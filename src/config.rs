//! Configuration management for the DPR risk classifier

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable overriding the configuration file path
pub const CONFIG_PATH_ENV: &str = "DPR_CONFIG";

/// What to do when a ratio feature has a zero denominator
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ZeroDivisionPolicy {
    /// Fail the request with a division-by-zero error
    #[default]
    Reject,
    /// Substitute 0.0 for the affected ratios
    Zero,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    pub port: u16,
    /// Maximum number of records accepted by `/predict/batch`
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_max_batch_size() -> usize {
    256
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// ONNX export of the trained pipeline
    pub model_path: String,
    /// Optional JSON file listing numeric and categorical input columns
    #[serde(default)]
    pub schema_path: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Feature derivation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default)]
    pub zero_division: ZeroDivisionPolicy,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 60,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$DPR_CONFIG` or `config/config.toml`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with `DPR__SECTION__KEY` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("DPR")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_batch_size: default_max_batch_size(),
                cors_origins: Vec::new(),
            },
            models: ModelsConfig {
                model_path: "models/predict-pipeline.onnx".to_string(),
                schema_path: None,
                onnx_threads: 1,
            },
            features: FeaturesConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.features.zero_division, ZeroDivisionPolicy::Reject);
        assert_eq!(config.models.onnx_threads, 1);
        assert!(config.server.cors_origins.is_empty());
    }

    #[test]
    fn test_load_from_path() {
        let path = std::env::temp_dir().join(format!("dpr-config-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 9100

[models]
model_path = "models/pipeline.onnx"
schema_path = "models/schema.json"

[features]
zero_division = "zero"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.bind_address(), "127.0.0.1:9100");
        assert_eq!(config.server.max_batch_size, 256);
        assert_eq!(config.models.schema_path.as_deref(), Some("models/schema.json"));
        assert_eq!(config.features.zero_division, ZeroDivisionPolicy::Zero);
        assert_eq!(config.metrics.report_interval_secs, 60);
        assert_eq!(config.logging.format, "json");
    }
}
