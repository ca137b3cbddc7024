use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://news.ycombinator.com/newest";
pub const DEFAULT_REPORT_PATH: &str = "order-report.json";

/// Parameters for one validation run. Always fully populated: fields missing
/// from a config file fall back to `Config::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target_count: u32,
    pub source_url: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub navigation_timeout_ms: u64,
    pub report_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_count: 100,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
            navigation_timeout_ms: 30_000,
            report_path: DEFAULT_REPORT_PATH.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Decode a settings submission. The payload must carry every field; a
    /// partial record is rejected rather than patched from older state.
    pub fn from_submission(payload: serde_json::Value) -> Result<Self, ConfigError> {
        let submitted: Submission = serde_json::from_value(payload)?;
        let config = Config {
            target_count: submitted.target_count,
            source_url: submitted.source_url.trim().to_string(),
            max_retries: submitted.max_retries,
            retry_delay_ms: submitted.retry_delay_ms,
            navigation_timeout_ms: submitted.navigation_timeout_ms,
            report_path: submitted.report_path.trim().to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_count == 0 {
            return Err(ConfigError::Invalid {
                field: "target_count",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.navigation_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "navigation_timeout_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        match reqwest::Url::parse(&self.source_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "source_url",
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                })
            }
            Err(e) => {
                return Err(ConfigError::Invalid {
                    field: "source_url",
                    reason: e.to_string(),
                })
            }
        }
        if self.report_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "report_path",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// Wire shape of the settings form. No `serde(default)`: every field is required.
#[derive(Debug, Deserialize)]
struct Submission {
    target_count: u32,
    source_url: String,
    max_retries: u32,
    retry_delay_ms: u64,
    navigation_timeout_ms: u64,
    report_path: String,
}

/// Active configuration owned by the run lifecycle. The active value only
/// changes when a new submission starts a run; it seeds the next settings view.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    active: Config,
}

impl ConfigStore {
    pub fn new(initial: Config) -> Self {
        Self { active: initial }
    }

    pub fn active(&self) -> &Config {
        &self.active
    }

    pub fn replace(&mut self, next: Config) -> Config {
        std::mem::replace(&mut self.active, next)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_payload() -> serde_json::Value {
        json!({
            "target_count": 70,
            "source_url": "https://news.ycombinator.com/newest",
            "max_retries": 2,
            "retry_delay_ms": 250,
            "navigation_timeout_ms": 5000,
            "report_path": "out/report.json",
        })
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::load(Path::new("order-check.toml")).unwrap();
        assert_eq!(config.target_count, 100);
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("target_count = 42\n").unwrap();
        assert_eq!(config.target_count, 42);
        assert_eq!(config.report_path, DEFAULT_REPORT_PATH);
        assert_eq!(config.navigation_timeout_ms, 30_000);
    }

    #[test]
    fn test_submission_full_record() {
        let config = Config::from_submission(full_payload()).unwrap();
        assert_eq!(config.target_count, 70);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.report_path, "out/report.json");
    }

    #[test]
    fn test_submission_missing_field_rejected() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("max_retries");
        let err = Config::from_submission(payload).unwrap_err();
        assert!(matches!(err, ConfigError::Payload(_)));
    }

    #[test]
    fn test_submission_zero_target_rejected() {
        let mut payload = full_payload();
        payload["target_count"] = json!(0);
        let err = Config::from_submission(payload).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "target_count", .. }));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = Config {
            source_url: "file:///etc/passwd".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            source_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_replaces_wholesale() {
        let mut store = ConfigStore::default();
        let next = Config {
            target_count: 5,
            max_retries: 0,
            ..Config::default()
        };
        let previous = store.replace(next.clone());
        assert_eq!(previous, Config::default());
        assert_eq!(store.active(), &next);
    }
}
