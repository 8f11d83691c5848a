//! Demo Configuration
//!
//! Read from the JSON file named by `TANDEM_CONFIG`. Missing fields keep
//! their defaults; an unset variable means all defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable holding the config file path
pub const CONFIG_ENV: &str = "TANDEM_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Threads spawned by the counter demo
    pub counter_tasks: usize,
    /// Amount each counter thread adds
    pub counter_delta: u64,
    /// Workers for the pool demo (0 means the pool default)
    pub pool_workers: usize,
    /// Deadline for the pool demo, in milliseconds
    pub pool_timeout_ms: u64,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl DemoConfig {
    /// Load from `TANDEM_CONFIG`, falling back to defaults when unset
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_timeout_ms)
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            counter_tasks: 300,
            counter_delta: 5,
            pool_workers: 3,
            pool_timeout_ms: 1000,
            log_filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.counter_tasks, 300);
        assert_eq!(config.counter_delta, 5);
        assert_eq!(config.pool_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json() {
        let config = DemoConfig::from_json(r#"{ "pool_workers": 8, "log_filter": "debug" }"#).unwrap();
        assert_eq!(config.pool_workers, 8);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.counter_tasks, 300);
    }

    #[test]
    fn test_malformed_json() {
        assert!(DemoConfig::from_json("{ not json").is_err());
        assert!(DemoConfig::from_json(r#"{ "counter_tasks": -1 }"#).is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = DemoConfig::from_file(Path::new("/nonexistent/tandem.json")).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
