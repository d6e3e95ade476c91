use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BATTERY_CHECK_PERIOD_MS: u64 = 500;
pub const DEFAULT_TELEMETRY_PERIOD_MS: u64 = 500;
// EU 868 MHz ISM band
pub const DEFAULT_RADIO_FREQUENCY_HZ: u32 = 868_000_000;
pub const DEFAULT_LOW_BATTERY_THRESHOLD_V: f32 = 3.4;
pub const DEFAULT_FAULT_BLINK_ON_MS: u32 = 200;
pub const DEFAULT_FAULT_BLINK_OFF_MS: u32 = 1000;

/// Startup parameters of the transmitter. Fixed once the control loop runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitterConfig {
    pub battery_check_period_ms: u64,
    pub telemetry_period_ms: u64,
    pub radio_frequency_hz: u32,
    pub low_battery_threshold_v: f32,
    pub fault_blink_on_ms: u32,
    pub fault_blink_off_ms: u32,
    /// Mirror switch readings and outgoing frames on the diagnostics log target.
    pub diagnostics: bool,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            battery_check_period_ms: DEFAULT_BATTERY_CHECK_PERIOD_MS,
            telemetry_period_ms: DEFAULT_TELEMETRY_PERIOD_MS,
            radio_frequency_hz: DEFAULT_RADIO_FREQUENCY_HZ,
            low_battery_threshold_v: DEFAULT_LOW_BATTERY_THRESHOLD_V,
            fault_blink_on_ms: DEFAULT_FAULT_BLINK_ON_MS,
            fault_blink_off_ms: DEFAULT_FAULT_BLINK_OFF_MS,
            diagnostics: false,
        }
    }
}

impl TransmitterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.battery_check_period_ms == 0 {
            return Err(invalid("battery_check_period_ms", "must be non-zero"));
        }
        if self.telemetry_period_ms == 0 {
            return Err(invalid("telemetry_period_ms", "must be non-zero"));
        }
        if self.radio_frequency_hz == 0 {
            return Err(invalid("radio_frequency_hz", "must be non-zero"));
        }
        if !self.low_battery_threshold_v.is_finite() || self.low_battery_threshold_v <= 0.0 {
            return Err(invalid("low_battery_threshold_v", "must be a positive voltage"));
        }
        if self.fault_blink_on_ms == 0 || self.fault_blink_off_ms == 0 {
            return Err(invalid("fault_blink", "both blink phases must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
