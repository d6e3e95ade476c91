use super::battery::BatteryState;
use embedded_hal::digital::StatefulOutputPin;

/// Power-status LED policy.
///
/// While the battery is low every check inverts the LED, so a steady check
/// cadence shows up as blinking. Any check that is not low drives it solid on.
#[derive(Debug)]
pub struct PowerIndicator<L> {
    led: L,
}

impl<L: StatefulOutputPin> PowerIndicator<L> {
    pub fn new(led: L) -> Self {
        Self { led }
    }

    /// Apply one battery check. Returns the resulting LED level.
    pub fn show(&mut self, battery: &BatteryState) -> Result<bool, L::Error> {
        if battery.is_low {
            self.led.toggle()?;
        } else {
            self.led.set_high()?;
        }
        self.led.is_set_high()
    }

    pub fn on(&mut self) -> Result<(), L::Error> {
        self.led.set_high()
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}
