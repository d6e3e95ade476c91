use crate::config::TransmitterConfig;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use tracing::error;

/// On/off timing of the link LED while the transmitter is halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub on_ms: u32,
    pub off_ms: u32,
}

impl From<&TransmitterConfig> for BlinkPattern {
    fn from(config: &TransmitterConfig) -> Self {
        Self {
            on_ms: config.fault_blink_on_ms,
            off_ms: config.fault_blink_off_ms,
        }
    }
}

impl Default for BlinkPattern {
    fn default() -> Self {
        Self::from(&TransmitterConfig::default())
    }
}

#[derive(Debug)]
pub struct FaultBlinker<L, D> {
    led: L,
    delay: D,
    pattern: BlinkPattern,
    cycles: u64,
}

impl<L: OutputPin, D: DelayNs> FaultBlinker<L, D> {
    pub fn new(led: L, delay: D, pattern: BlinkPattern) -> Self {
        Self {
            led,
            delay,
            pattern,
            cycles: 0,
        }
    }

    /// One full on/off period. Timing is kept even if the pin reports an error.
    pub fn blink_once(&mut self) -> Result<(), L::Error> {
        let on = self.led.set_high();
        self.delay.delay_ms(self.pattern.on_ms);
        let off = self.led.set_low();
        self.delay.delay_ms(self.pattern.off_ms);
        self.cycles = self.cycles.saturating_add(1);
        on.and(off)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn pattern(&self) -> BlinkPattern {
        self.pattern
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Blink until `until_cycle` cycles have run in total, or without end
    /// for `None`. Returns how many cycles hit a pin error.
    pub fn run(&mut self, until_cycle: Option<u64>) -> u64 {
        let mut pin_errors = 0u64;
        loop {
            if until_cycle.is_some_and(|limit| self.cycles >= limit) {
                return pin_errors;
            }
            // Nothing left to report to; the blink itself is the signal.
            if self.blink_once().is_err() {
                pin_errors = pin_errors.saturating_add(1);
            }
        }
    }

    /// Fail-stop: blink the link LED forever. Only a reset leaves this state.
    pub fn halt(mut self) -> ! {
        error!(
            on_ms = self.pattern.on_ms,
            off_ms = self.pattern.off_ms,
            "transmitter halted"
        );
        loop {
            self.run(None);
        }
    }
}
