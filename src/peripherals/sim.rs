//! Simulated hardware.
//!
//! Backs the host simulator and the test suite. Handles are cheap clones
//! sharing one underlying state, so a test or an operator console can keep
//! a handle after the device itself has been moved into the transmitter.

use super::battery::{VoltageDivider, VoltageSensor};
use super::radio::RadioLink;
use super::switch::SwitchReader;
use crate::encoder::{Position, SwitchOrdinal};
use crate::error::RadioError;
use crate::frame::{Packet, MAX_PACKET_SIZE};
use crate::scheduler::Monotonic;
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use heapless::HistoryBuffer;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

const RADIO_HISTORY: usize = 8;
const DELAY_HISTORY: usize = 16;

#[derive(Debug, Clone)]
pub struct SimSwitch {
    ordinal: Arc<AtomicU8>,
}

impl SimSwitch {
    pub fn new(position: Position) -> Self {
        Self {
            ordinal: Arc::new(AtomicU8::new(position.ordinal())),
        }
    }

    pub fn set_position(&self, position: Position) {
        self.set_ordinal(position.ordinal());
    }

    /// Force a raw reading, including ones a healthy switch never produces.
    pub fn set_ordinal(&self, ordinal: SwitchOrdinal) {
        self.ordinal.store(ordinal, Ordering::Relaxed);
    }
}

impl SwitchReader for SimSwitch {
    fn read_ordinal(&mut self) -> SwitchOrdinal {
        self.ordinal.load(Ordering::Relaxed)
    }
}

/// Battery voltage source, optionally quantized through an ADC divider.
#[derive(Debug, Clone)]
pub struct SimBattery {
    millivolts: Arc<AtomicU32>,
    adc: Option<VoltageDivider>,
}

impl SimBattery {
    pub fn new(volts: f32) -> Self {
        let battery = Self {
            millivolts: Arc::new(AtomicU32::new(0)),
            adc: None,
        };
        battery.set_voltage(volts);
        battery
    }

    pub fn with_adc(volts: f32, divider: VoltageDivider) -> Self {
        Self {
            adc: Some(divider),
            ..Self::new(volts)
        }
    }

    pub fn set_voltage(&self, volts: f32) {
        let mv = (volts.max(0.0) * 1000.0).round() as u32;
        self.millivolts.store(mv, Ordering::Relaxed);
    }

    pub fn voltage(&self) -> f32 {
        self.millivolts.load(Ordering::Relaxed) as f32 / 1000.0
    }
}

impl VoltageSensor for SimBattery {
    fn read_voltage(&mut self) -> f32 {
        let volts = self.voltage();
        match self.adc {
            Some(divider) => divider.to_volts(divider.to_raw(volts)),
            None => volts,
        }
    }
}

/// LED that records its level and how often the level changed.
#[derive(Debug, Clone)]
pub struct SimLed {
    lit: Arc<AtomicBool>,
    transitions: Arc<AtomicU32>,
}

impl SimLed {
    pub fn new(lit: bool) -> Self {
        Self {
            lit: Arc::new(AtomicBool::new(lit)),
            transitions: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Relaxed)
    }

    pub fn transitions(&self) -> u32 {
        self.transitions.load(Ordering::Relaxed)
    }

    fn drive(&self, level: bool) {
        if self.lit.swap(level, Ordering::Relaxed) != level {
            self.transitions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true);
        Ok(())
    }
}

impl StatefulOutputPin for SimLed {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_lit())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_lit())
    }
}

/// In-memory transceiver. Keeps the most recent packets it accepted.
#[derive(Debug)]
pub struct SimRadio {
    fail_init: bool,
    frequency_hz: Option<u32>,
    busy_polls: u32,
    sent: u32,
    history: HistoryBuffer<Packet, RADIO_HISTORY>,
}

impl SimRadio {
    pub fn new() -> Self {
        Self {
            fail_init: false,
            frequency_hz: None,
            busy_polls: 0,
            sent: 0,
            history: HistoryBuffer::new(),
        }
    }

    /// A radio that is absent or miswired: init always fails.
    pub fn absent() -> Self {
        Self {
            fail_init: true,
            ..Self::new()
        }
    }

    /// Report busy for the next `polls` transmit attempts.
    pub fn set_busy_for(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    pub fn frequency_hz(&self) -> Option<u32> {
        self.frequency_hz
    }

    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    pub fn last_packet(&self) -> Option<&[u8]> {
        self.history.recent().map(|p| p.as_slice())
    }

    pub fn packets(&self) -> impl Iterator<Item = &[u8]> {
        self.history.oldest_ordered().map(|p| p.as_slice())
    }
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl RadioLink for SimRadio {
    fn init(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        if self.fail_init {
            return Err(RadioError::InitFailed { frequency_hz });
        }
        self.frequency_hz = Some(frequency_hz);
        Ok(())
    }

    fn transmit(&mut self, payload: &[u8]) -> nb::Result<(), RadioError> {
        if self.frequency_hz.is_none() {
            return Err(nb::Error::Other(RadioError::NotInitialized));
        }
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }

        let mut packet = Packet::new();
        packet
            .try_extend_from_slice(payload)
            .map_err(|_| nb::Error::Other(RadioError::PayloadTooLarge { len: payload.len(), max: MAX_PACKET_SIZE }))?;

        self.history.write(packet);
        self.sent = self.sent.saturating_add(1);
        Ok(())
    }
}

/// Manually advanced millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ms: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::Relaxed);
    }
}

impl Monotonic for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

/// Delay that returns immediately and records what it was asked to wait.
#[derive(Debug, Default)]
pub struct SimDelay {
    total_ns: u64,
    recent_ms: HistoryBuffer<u32, DELAY_HISTORY>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    pub fn recent_ms(&self) -> impl Iterator<Item = u32> + '_ {
        self.recent_ms.oldest_ordered().copied()
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns = self.total_ns.saturating_add(u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns = self.total_ns.saturating_add(u64::from(ms) * 1_000_000);
        self.recent_ms.write(ms);
    }
}
