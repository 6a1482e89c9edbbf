use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::kernel::time::TimestampUnit;

const DEFAULT_ENDPOINT: &str = "https://127.0.0.1:8443/api/incoming";

/// Agent configuration. Defaults, then a JSON file, then `FIELDPROBE_*` env vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Collector URL receiving one POST per session boundary.
    pub endpoint: String,
    pub upload_timeout_ms: u64,
    /// Period of the coarse sampling tick.
    pub tick_interval_secs: u64,
    pub timestamp_unit: TimestampUnit,
    /// Platform tag sent with every record.
    pub platform: String,
    /// Overrides the device id reported by the device-info provider.
    pub device_id: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            upload_timeout_ms: 10_000,
            tick_interval_secs: 60,
            timestamp_unit: TimestampUnit::Seconds,
            platform: std::env::consts::OS.to_string(),
            device_id: None,
        }
    }
}

impl AgentConfig {
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Full load: optional file, then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                debug!(path = %p.display(), "loading config file");
                Self::from_file(p)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `FIELDPROBE_*` overrides from `lookup` (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("FIELDPROBE_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(raw) = lookup("FIELDPROBE_TICK_SECS") {
            self.tick_interval_secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "FIELDPROBE_TICK_SECS",
                reason: format!("'{}' is not a whole number of seconds", raw),
            })?;
        }
        if let Some(raw) = lookup("FIELDPROBE_TIMESTAMP_UNIT") {
            self.timestamp_unit = match raw.trim().to_ascii_lowercase().as_str() {
                "seconds" => TimestampUnit::Seconds,
                "millis" => TimestampUnit::Millis,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "FIELDPROBE_TIMESTAMP_UNIT",
                        reason: format!("expected 'seconds' or 'millis', got '{}'", other),
                    })
                }
            };
        }
        if let Some(device_id) = lookup("FIELDPROBE_DEVICE_ID") {
            self.device_id = Some(device_id);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                reason: format!("'{}' is not an http(s) URL", self.endpoint),
            });
        }
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "tick_interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_timeout_ms)
    }
}
