//! Machine configuration.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid machine configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid machine configuration: idle_timeout_ms must be greater than zero")]
    ZeroIdleTimeout,
}

/// Tunables for a [`StateMachine`](crate::machine::StateMachine).
///
/// # Example
///
/// ```rust
/// use evfsm::config::MachineConfig;
/// use std::time::Duration;
///
/// let config = MachineConfig::from_json(r#"{ "idle_timeout_ms": 250 }"#).unwrap();
/// assert_eq!(config.idle_timeout, Duration::from_millis(250));
/// assert_eq!(config.history_limit, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// How long the main loop waits for a message before synthesizing TIMEOUT
    #[serde(
        rename = "idle_timeout_ms",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub idle_timeout: Duration,

    /// Number of transitions retained in the machine's history
    pub history_limit: usize,

    /// Name for the background worker thread
    pub thread_name: Option<String>,
}

impl MachineConfig {
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.idle_timeout.is_zero() {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        Ok(config)
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            history_limit: 64,
            thread_name: None,
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    serializer.serialize_u64(millis)
}

fn deserialize_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MachineConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_millis(100));
        assert_eq!(config.history_limit, 64);
        assert!(config.thread_name.is_none());
    }

    #[test]
    fn empty_json_yields_defaults() {
        assert_eq!(MachineConfig::from_json("{}").unwrap(), MachineConfig::default());
    }

    #[test]
    fn full_json_is_parsed() {
        let config = MachineConfig::from_json(
            r#"{ "idle_timeout_ms": 2000, "history_limit": 4, "thread_name": "door" }"#,
        )
        .unwrap();
        assert_eq!(config.idle_timeout, Duration::from_secs(2));
        assert_eq!(config.history_limit, 4);
        assert_eq!(config.thread_name.as_deref(), Some("door"));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = MachineConfig::from_json(r#"{ "idle_timeout_ms": "soon" }"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid machine configuration"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = MachineConfig::from_json(r#"{ "idle_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroIdleTimeout));
    }

    #[test]
    fn serializes_timeout_as_millis() {
        let config = MachineConfig::default().with_idle_timeout(Duration::from_millis(1500));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["idle_timeout_ms"], 1500);
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = MachineConfig::default()
            .with_history_limit(1)
            .with_thread_name("worker");
        assert_eq!(config.history_limit, 1);
        assert_eq!(config.thread_name.as_deref(), Some("worker"));
    }
}
