use serde::{Deserialize, Serialize};

/// Source of battery voltage samples, in volts.
pub trait VoltageSensor {
    fn read_voltage(&mut self) -> f32;
}

/// Resistor divider in front of an ADC input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageDivider {
    pub adc_max: u16,
    pub reference_v: f32,
    pub r_top_ohm: u32,
    pub r_bottom_ohm: u32,
}

impl VoltageDivider {
    /// 10-bit ADC, 3.3 V reference, battery fed through 10k/10k.
    pub const fn default_board() -> Self {
        Self {
            adc_max: 1023,
            reference_v: 3.3,
            r_top_ohm: 10_000,
            r_bottom_ohm: 10_000,
        }
    }

    pub fn to_volts(&self, raw: u16) -> f32 {
        let raw = raw.min(self.adc_max);
        let pin_v = f32::from(raw) * self.reference_v / f32::from(self.adc_max);
        let ratio = (self.r_top_ohm + self.r_bottom_ohm) as f32 / self.r_bottom_ohm as f32;
        pin_v * ratio
    }

    /// ADC reading the divider would produce for a battery at `volts`.
    pub fn to_raw(&self, volts: f32) -> u16 {
        let ratio = (self.r_top_ohm + self.r_bottom_ohm) as f32 / self.r_bottom_ohm as f32;
        let counts = (volts / ratio) * f32::from(self.adc_max) / self.reference_v;
        counts.round().clamp(0.0, f32::from(self.adc_max)) as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryState {
    pub voltage: f32,
    pub is_low: bool,
}

/// Samples the battery and classifies it against a fixed threshold.
#[derive(Debug)]
pub struct BatteryMonitor<S> {
    sensor: S,
    threshold_v: f32,
}

impl<S: VoltageSensor> BatteryMonitor<S> {
    pub fn new(sensor: S, threshold_v: f32) -> Self {
        debug_assert!(threshold_v.is_finite(), "battery threshold must be finite");
        Self { sensor, threshold_v }
    }

    pub fn read_voltage(&mut self) -> f32 {
        self.sensor.read_voltage()
    }

    /// Low means strictly below the threshold.
    pub fn is_low(&self, voltage: f32) -> bool {
        voltage < self.threshold_v
    }

    pub fn sample(&mut self) -> BatteryState {
        let voltage = self.read_voltage();
        BatteryState {
            voltage,
            is_low: self.is_low(voltage),
        }
    }

    pub fn threshold_v(&self) -> f32 {
        self.threshold_v
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl VoltageSensor for Fixed {
        fn read_voltage(&mut self) -> f32 {
            self.0
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let monitor = BatteryMonitor::new(Fixed(0.0), 3.4);
        assert!(monitor.is_low(3.39));
        assert!(!monitor.is_low(3.4));
        assert!(!monitor.is_low(4.2));
    }

    #[test]
    fn test_sample_classifies_reading() {
        let mut monitor = BatteryMonitor::new(Fixed(3.1), 3.4);
        let state = monitor.sample();
        assert_eq!(state.voltage, 3.1);
        assert!(state.is_low);
    }

    #[test]
    fn test_divider_conversion() {
        let divider = VoltageDivider::default_board();
        assert_eq!(divider.to_volts(0), 0.0);
        assert!((divider.to_volts(1023) - 6.6).abs() < 1e-4);
        // Saturates at full scale
        assert_eq!(divider.to_volts(u16::MAX), divider.to_volts(1023));
        assert_eq!(divider.to_raw(6.6), 1023);
        assert_eq!(divider.to_raw(-1.0), 0);
    }
}
