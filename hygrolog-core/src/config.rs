//! Acquisition Configuration
//!
//! One explicit configuration value passed into the orchestrator at
//! construction, replacing any notion of process-wide device constants.
//! Defaults match the reference deployment: a single hygrometer, three
//! retained readings, one-second idle ticks.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one device acquisition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Stable device identifier (BLE MAC address string)
    pub device_id: String,
    /// Location of the SQLite ring store
    pub db_path: PathBuf,
    /// Maximum readings retained by the store
    pub capacity: usize,
    /// Idle tick interval of the continuous monitor loop
    pub poll_interval: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// Maximum age a partial fusion value may reach before it is discarded
    /// instead of being paired with a fresh counterpart
    pub max_partial_age: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            db_path: PathBuf::from("sensor_data.db"),
            capacity: 3,
            poll_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
            max_partial_age: Duration::from_secs(300),
        }
    }
}

impl MonitorConfig {
    /// Set the device identifier
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Set the store location
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Set the retained-reading capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the idle tick interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the connection deadline
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the stale-partial bound of the fusion window
    pub fn with_max_partial_age(mut self, age: Duration) -> Self {
        self.max_partial_age = age;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = MonitorConfig::default();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.db_path, PathBuf::from("sensor_data.db"));
    }

    #[test]
    fn builder_overrides() {
        let config = MonitorConfig::default()
            .with_device_id("A4:C1:38:AA:BB:CC")
            .with_capacity(5)
            .with_max_partial_age(Duration::from_secs(60));
        assert_eq!(config.device_id, "A4:C1:38:AA:BB:CC");
        assert_eq!(config.capacity, 5);
        assert_eq!(config.max_partial_age, Duration::from_secs(60));
    }
}
