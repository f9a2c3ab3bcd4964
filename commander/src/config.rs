use std::{path::Path, time::Duration};

use motorcore::control::ControlConfig;
use serde::{Deserialize, Serialize};

use crate::util::serde::deserialize_from_json_file;

/// Everything both ends of the link need to agree on, plus the emulated controller timing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
    /// time between two frames sent by the host
    pub period_ms: u64,
    /// how long the host waits for the acknowledgment of each frame
    pub ack_timeout_ms: u64,
    /// scheduler tick of the emulated controller
    pub tick_ms: u64,
    /// control task period, in scheduler ticks
    pub control_period_ticks: u32,
    pub control: ControlConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            period_ms: 500,
            ack_timeout_ms: 500,
            tick_ms: 1,
            control_period_ticks: 500,
            control: ControlConfig::default(),
        }
    }
}

impl LinkConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
    pub fn tick(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self.tick_ms)
    }
}

/// Reads the configuration, falling back to the defaults when the file is missing or broken.
pub fn load_config(file: Option<&Path>) -> LinkConfig {
    let Some(file) = file else {
        return LinkConfig::default();
    };
    match deserialize_from_json_file(file) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not read configuration from {file:?}, using defaults: {e}");
            LinkConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use motorcore::control::SpeedMapping;
    use test_log::test;

    use super::*;
    use crate::util::serde::serialize_to_json_file_pretty;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir::TempDir::new("commander_test").unwrap();
        let file = dir.path().join("link.json");
        std::fs::write(&file, r#"{"port": "/dev/ttyACM1", "control": {"speed_mapping": "Scaled"}}"#).unwrap();

        let config = load_config(Some(&file));
        assert_eq!(config.port, "/dev/ttyACM1");
        assert_eq!(config.control.speed_mapping, SpeedMapping::Scaled);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.period(), Duration::from_millis(500));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempdir::TempDir::new("commander_test").unwrap();
        let file = dir.path().join("link.json");
        std::fs::write(&file, "{ not json").unwrap();

        assert_eq!(load_config(Some(&file)), LinkConfig::default());
        assert_eq!(load_config(Some(&dir.path().join("missing.json"))), LinkConfig::default());
        assert_eq!(load_config(None), LinkConfig::default());
    }

    #[test]
    fn saved_config_is_loaded_back() {
        let dir = tempdir::TempDir::new("commander_test").unwrap();
        let file = dir.path().join("link.json");
        let config = LinkConfig {
            baud_rate: 115200,
            control_period_ticks: 50,
            ..Default::default()
        };
        serialize_to_json_file_pretty(&config, &file).unwrap();
        assert_eq!(load_config(Some(&file)), config);
    }
}
