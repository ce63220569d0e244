//! Configuration management for the Screenwing relay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! API keys are secrets and are never placed in the config file: they are
//! read from `GEMINI_API_KEY`, `GEMINI_API_KEY_2`, ... environment variables
//! at startup.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest `GEMINI_API_KEY_{n}` slot probed at startup.
const MAX_ENV_KEY_SLOTS: usize = 32;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-attempt timeout for upstream provider calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Upstream provider configuration
///
/// Generation parameters are fixed per deployment; they are not part of the
/// retry logic and never vary between attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f64 {
    0.95
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// When true, failure envelopes carry a `technicalError` field with the
    /// raw provider message. Keep off in production.
    #[serde(default)]
    pub expose_technical_errors: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            expose_technical_errors: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings that serde cannot express
    fn validate(&self) -> AppResult<()> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(AppError::Config(format!(
                "temperature must be in [0.0, 2.0], got {}",
                self.provider.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.provider.top_p) {
            return Err(AppError::Config(format!(
                "top_p must be in [0.0, 1.0], got {}",
                self.provider.top_p
            )));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "request_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.provider.base_url.trim_end_matches('/').is_empty() {
            return Err(AppError::Config("provider base_url is empty".to_string()));
        }
        Ok(())
    }

    /// Apply environment overrides (`GEMINI_MODEL`)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GEMINI_MODEL")
            && !model.trim().is_empty()
        {
            self.provider.model = model;
        }
    }
}

/// Read the ordered API key list from the environment.
///
/// Slot 1 is `GEMINI_API_KEY`, slots 2..=32 are `GEMINI_API_KEY_{n}`. Unset
/// or blank slots yield `None`; the pool filters them out and fails fast if
/// nothing remains.
pub fn keys_from_env() -> Vec<Option<String>> {
    (1..=MAX_ENV_KEY_SLOTS)
        .map(|i| {
            let name = if i == 1 {
                "GEMINI_API_KEY".to_string()
            } else {
                format!("GEMINI_API_KEY_{}", i)
            };
            std::env::var(&name)
                .ok()
                .filter(|v| !v.trim().is_empty())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[server]
host = "127.0.0.1"
port = 3000
"#;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config = Config::from_toml(MINIMAL).expect("should parse");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.top_k, 40);
        assert!(!config.observability.expose_technical_errors);
    }

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
request_timeout_seconds = 10

[provider]
base_url = "http://localhost:9999"
model = "gemini-test"
temperature = 0.4
top_k = 20
top_p = 0.9

[observability]
log_level = "debug"
expose_technical_errors = true
"#;
        let config = Config::from_toml(toml).expect("should parse");
        assert_eq!(config.provider.base_url, "http://localhost:9999");
        assert_eq!(config.provider.model, "gemini-test");
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.expose_technical_errors);
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000

[provider]
temperature = 3.5
"#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
request_timeout_seconds = 0
"#;
        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("request_timeout_seconds"));
    }

    #[test]
    fn test_from_file_missing_path_errors() {
        let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).expect("write config");

        let config = Config::from_file(&path).expect("should load");
        assert_eq!(config.server.port, 3000);
    }
}
