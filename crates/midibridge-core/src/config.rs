//! Bridge configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::wake::DEFAULT_WAKE_POLL_INTERVAL;

/// Everything needed to construct a bridge.
///
/// ```ignore
/// let config: BridgeConfig = serde_json::from_str(r#"{
///     "client_name": "router",
///     "input_ports": ["in"],
///     "output_ports": ["out_a", "out_b"]
/// }"#)?;
/// config.validate()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub client_name: String,
    pub input_ports: Vec<String>,
    pub output_ports: Vec<String>,
    /// Capacity of each of the two event queues.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on how long a blocked reader sleeps before re-checking.
    #[serde(default = "default_wake_poll_interval_ms")]
    pub wake_poll_interval_ms: u64,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_wake_poll_interval_ms() -> u64 {
    DEFAULT_WAKE_POLL_INTERVAL.as_millis() as u64
}

impl BridgeConfig {
    /// Config with no ports and default queue and wake settings.
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            wake_poll_interval_ms: default_wake_poll_interval_ms(),
        }
    }

    /// Wake poll interval as a `Duration`.
    pub fn wake_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wake_poll_interval_ms)
    }

    /// Reject configurations a bridge cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.client_name.trim().is_empty() {
            return Err(Error::InvalidConfig("client name is empty".into()));
        }
        if self.input_ports.is_empty() {
            return Err(Error::InvalidConfig("no input ports configured".into()));
        }
        if self.output_ports.is_empty() {
            return Err(Error::InvalidConfig("no output ports configured".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue capacity must be non-zero".into()));
        }

        let mut seen = HashSet::new();
        for name in self.input_ports.iter().chain(&self.output_ports) {
            if name.trim().is_empty() {
                return Err(Error::InvalidConfig("port name is empty".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::InvalidConfig(format!("duplicate port name '{name}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BridgeConfig {
        BridgeConfig {
            input_ports: vec!["in".into()],
            output_ports: vec!["out".into()],
            ..BridgeConfig::new("bridge")
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert_eq!(valid().queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(valid().wake_poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_rejects_missing_parts() {
        let mut config = valid();
        config.client_name = "  ".into();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = valid();
        config.input_ports.clear();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.output_ports.clear();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_port_names() {
        let mut config = valid();
        config.output_ports.push("in".into());
        assert_eq!(
            config.validate(),
            Err(Error::InvalidConfig("duplicate port name 'in'".into()))
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"client_name": "router", "input_ports": ["a", "b"], "output_ports": ["out"]}"#,
        )
        .unwrap();
        assert_eq!(config.client_name, "router");
        assert_eq!(config.input_ports, vec!["a", "b"]);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.wake_poll_interval_ms, 10);
        assert!(config.validate().is_ok());
    }
}
