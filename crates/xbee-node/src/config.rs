//! Node configuration.
//!
//! Loaded from YAML; every field has a default so a config file only needs
//! the values that differ:
//!
//! ```yaml
//! name: greenhouse-01
//! uart:
//!   connect: 192.168.1.20:9750
//! report_interval_secs: 60
//! destination: "0013A20040529F3C"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xbee_api::{Address64, ApiMode, StartRecovery};

use crate::error::{NodeError, NodeResult};

/// Seconds between sensor reports.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 45;

/// Longest accepted report interval (one week).
pub const MAX_REPORT_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Connection to the serial radio bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// TCP address of the bridge exposing the radio's UART.
    pub connect: String,
    /// Bytes buffered between the reader thread and the node.
    pub rx_queue_capacity: usize,
}

impl Default for UartConfig {
    fn default() -> Self {
        UartConfig {
            connect: "127.0.0.1:9750".to_string(),
            rx_queue_capacity: 1024,
        }
    }
}

/// Baseline values for the simulated sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Hectopascals.
    pub pressure: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Lux.
    pub light: f64,
    /// Each reading varies by up to this fraction of its baseline.
    pub jitter: f64,
    /// Fixed RNG seed, for reproducible readings.
    pub seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            temperature: 21.5,
            pressure: 1013.25,
            humidity: 45.0,
            light: 180.0,
            jitter: 0.02,
            seed: None,
        }
    }
}

/// Top-level node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name, used in logs and metric labels.
    pub name: String,
    pub uart: UartConfig,
    pub report_interval_secs: u64,
    /// Sleep between polls when no bytes are waiting.
    pub poll_interval_ms: u64,
    pub api_mode: ApiMode,
    pub start_recovery: StartRecovery,
    /// Arguments accepted per command line, command included.
    pub max_args: usize,
    /// Destination of sensor reports, as 16 hex digits.
    pub destination: String,
    pub sensors: SensorConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            name: "xbee-node".to_string(),
            uart: UartConfig::default(),
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            poll_interval_ms: 10,
            api_mode: ApiMode::Escaped,
            start_recovery: StartRecovery::Resync,
            max_args: xbee_cmdline::DEFAULT_MAX_ARGS,
            destination: Address64::COORDINATOR.to_string(),
            sensors: SensorConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Read a YAML config file.
    pub fn load(path: &Path) -> NodeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), name = %config.name, "Loaded node configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> NodeResult<Self> {
        let config: NodeConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be run with.
    pub fn validate(&self) -> NodeResult<()> {
        self.destination()?;
        if self.report_interval_secs > MAX_REPORT_INTERVAL_SECS {
            return Err(NodeError::InvalidSetting {
                field: "report_interval_secs",
                reason: format!(
                    "{} exceeds {}",
                    self.report_interval_secs, MAX_REPORT_INTERVAL_SECS
                ),
            });
        }
        if !self.sensors.jitter.is_finite() {
            return Err(NodeError::InvalidSetting {
                field: "sensors.jitter",
                reason: format!("{} is not a finite number", self.sensors.jitter),
            });
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_connect(mut self, address: impl Into<String>) -> Self {
        self.uart.connect = address.into();
        self
    }

    pub fn with_report_interval_secs(mut self, secs: u64) -> Self {
        self.report_interval_secs = secs;
        self
    }

    pub fn with_api_mode(mut self, mode: ApiMode) -> Self {
        self.api_mode = mode;
        self
    }

    pub fn with_start_recovery(mut self, recovery: StartRecovery) -> Self {
        self.start_recovery = recovery;
        self
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs.clamp(1, MAX_REPORT_INTERVAL_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse the report destination.
    pub fn destination(&self) -> NodeResult<Address64> {
        parse_address64(&self.destination)
    }
}

/// Parse a 64-bit address written as 16 hex digits.
pub fn parse_address64(text: &str) -> NodeResult<Address64> {
    let mut bytes = [0u8; 8];
    hex::decode_to_slice(text.trim(), &mut bytes)
        .map_err(|_| NodeError::InvalidAddress(text.to_string()))?;
    Ok(Address64(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NodeConfig::default();
        assert_eq!(config.report_interval(), Duration::from_secs(45));
        assert_eq!(config.max_args, 1);
        assert_eq!(config.api_mode, ApiMode::Escaped);
        assert_eq!(config.start_recovery, StartRecovery::Resync);
        assert_eq!(config.destination().unwrap(), Address64::COORDINATOR);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
name: greenhouse-01
uart:
  connect: 10.0.0.5:9750
report_interval_secs: 60
api_mode: unescaped
start_recovery: discard
destination: 0013A20040529F3C
sensors:
  temperature: 18.0
  seed: 7
"#;
        let config = NodeConfig::from_yaml(yaml).expect("config should parse");
        assert_eq!(config.name, "greenhouse-01");
        assert_eq!(config.uart.connect, "10.0.0.5:9750");
        assert_eq!(config.uart.rx_queue_capacity, 1024);
        assert_eq!(config.report_interval_secs, 60);
        assert_eq!(config.api_mode, ApiMode::Unescaped);
        assert_eq!(config.start_recovery, StartRecovery::Discard);
        assert_eq!(
            config.destination().unwrap(),
            Address64::from_u64(0x0013_A200_4052_9F3C)
        );
        assert_eq!(config.sensors.temperature, 18.0);
        assert_eq!(config.sensors.humidity, 45.0);
        assert_eq!(config.sensors.seed, Some(7));
    }

    #[test]
    fn test_bad_destination_rejected() {
        let err = NodeConfig::from_yaml("destination: 0013A200").unwrap_err();
        assert!(matches!(err, NodeError::InvalidAddress(_)));
        assert!(parse_address64("zz13A20040529F3C").is_err());
    }

    #[test]
    fn test_builders() {
        let config = NodeConfig::default()
            .with_name("bench")
            .with_connect("127.0.0.1:1")
            .with_report_interval_secs(0)
            .with_api_mode(ApiMode::Unescaped);
        assert_eq!(config.name, "bench");
        assert_eq!(config.uart.connect, "127.0.0.1:1");
        assert_eq!(config.report_interval(), Duration::from_secs(1));
        assert_eq!(config.api_mode, ApiMode::Unescaped);
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let err = NodeConfig::from_yaml("report_interval_secs: 18446744073709551615").unwrap_err();
        assert!(matches!(
            err,
            NodeError::InvalidSetting { field: "report_interval_secs", .. }
        ));

        for jitter in [".nan", ".inf", "-.inf"] {
            let yaml = format!("sensors:\n  jitter: {jitter}\n");
            let err = NodeConfig::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, NodeError::InvalidSetting { field: "sensors.jitter", .. }));
        }
    }

    #[test]
    fn test_report_interval_clamped() {
        let config = NodeConfig::default().with_report_interval_secs(u64::MAX);
        assert_eq!(
            config.report_interval(),
            Duration::from_secs(MAX_REPORT_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = NodeConfig::default().with_name("roundtrip");
        let text = serde_yaml::to_string(&config).expect("serialize");
        assert_eq!(NodeConfig::from_yaml(&text).expect("parse"), config);
    }
}
