use crate::config::TransmitterConfig;
use crate::encoder::{encode, CommandCode, SwitchOrdinal};
use crate::error::{StartupError, TransmitterError};
use crate::fault::{BlinkPattern, FaultBlinker};
use crate::frame::{self, Packet, TelemetryFrame};
use crate::peripherals::{
    BatteryMonitor, BatteryState, Peripherals, PowerIndicator, RadioLink, SwitchReader, VoltageSensor,
};
use crate::scheduler::{Monotonic, PeriodicTimer};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, StatefulOutputPin};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Log target of the optional diagnostic mirror.
pub const DIAGNOSTICS_TARGET: &str = "cushion_remote::diagnostics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    Sent,
    /// Transceiver still busy with the previous packet; this frame was dropped.
    Busy,
}

/// What one loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopReport {
    pub height: SwitchOrdinal,
    pub mass: SwitchOrdinal,
    pub code: CommandCode,
    pub battery: Option<BatteryState>,
    pub power_led_on: Option<bool>,
    pub transmission: Option<TxOutcome>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TransmitterStats {
    pub iterations: u64,
    pub invalid_codes: u64,
    pub battery_checks: u32,
    pub low_battery_checks: u32,
    pub frames_sent: u32,
    pub frames_dropped_busy: u32,
    pub send_errors: u32,
}

/// Startup was refused or the radio did not come up. Hands the link LED
/// back for the fault display.
#[derive(Debug)]
pub struct StartupFault<L> {
    pub link_led: L,
    pub error: StartupError,
}

/// Application context: every device handle plus the loop's timer state.
///
/// Built once by [`Transmitter::start`] and driven by [`Transmitter::poll`]
/// from a single thread.
#[derive(Debug)]
pub struct Transmitter<SW, V, R, L, C> {
    height_switch: SW,
    mass_switch: SW,
    battery: BatteryMonitor<V>,
    radio: R,
    power_led: PowerIndicator<L>,
    link_led: L,
    clock: C,
    config: TransmitterConfig,

    battery_timer: PeriodicTimer,
    telemetry_timer: PeriodicTimer,

    // Pending frame, overwritten every iteration
    frame: TelemetryFrame,
    packet: Packet,
    stats: TransmitterStats,
}

impl<SW, V, R, L, C> Transmitter<SW, V, R, L, C>
where
    SW: SwitchReader,
    V: VoltageSensor,
    R: RadioLink,
    L: StatefulOutputPin,
    C: Monotonic,
{
    /// Check the config, light both LEDs, bring up the radio, arm both timers.
    pub fn start(
        peripherals: Peripherals<SW, V, R, L>,
        clock: C,
        config: TransmitterConfig,
    ) -> Result<Self, StartupFault<L>> {
        let Peripherals {
            height_switch,
            mass_switch,
            battery,
            mut radio,
            power_led,
            mut link_led,
        } = peripherals;

        if let Err(e) = config.validate() {
            return Err(StartupFault {
                link_led,
                error: e.into(),
            });
        }

        let mut power_led = PowerIndicator::new(power_led);
        if let Err(e) = power_led.on() {
            warn!(kind = ?e.kind(), "power LED did not switch on");
        }
        if let Err(e) = link_led.set_high() {
            warn!(kind = ?e.kind(), "link LED did not switch on");
        }

        if let Err(e) = radio.init(config.radio_frequency_hz) {
            return Err(StartupFault {
                link_led,
                error: e.into(),
            });
        }
        if let Err(e) = link_led.set_high() {
            warn!(kind = ?e.kind(), "link LED did not switch on");
        }
        info!(frequency_hz = config.radio_frequency_hz, "radio init succeeded");

        let now = clock.now_ms();
        Ok(Self {
            height_switch,
            mass_switch,
            battery: BatteryMonitor::new(battery, config.low_battery_threshold_v),
            radio,
            power_led,
            link_led,
            battery_timer: PeriodicTimer::new(config.battery_check_period_ms, now),
            telemetry_timer: PeriodicTimer::new(config.telemetry_period_ms, now),
            clock,
            config,
            frame: TelemetryFrame::default(),
            packet: Packet::new(),
            stats: TransmitterStats::default(),
        })
    }

    /// [`Transmitter::start`], or the fail-stop blink if startup fails.
    pub fn boot<D: DelayNs>(
        peripherals: Peripherals<SW, V, R, L>,
        clock: C,
        delay: D,
        config: TransmitterConfig,
    ) -> Self {
        match Self::start_or_fault(peripherals, clock, delay, config) {
            Ok(transmitter) => transmitter,
            Err(blinker) => blinker.halt(),
        }
    }

    /// [`Transmitter::start`], handing back the armed fault display on failure.
    ///
    /// A rejected config blinks the default pattern, since its own blink
    /// timing cannot be trusted.
    pub fn start_or_fault<D: DelayNs>(
        peripherals: Peripherals<SW, V, R, L>,
        clock: C,
        delay: D,
        config: TransmitterConfig,
    ) -> Result<Self, FaultBlinker<L, D>> {
        let pattern = BlinkPattern::from(&config);
        Self::start(peripherals, clock, config).map_err(|StartupFault { link_led, error }| {
            warn!(%error, "transmitter startup failed");
            let pattern = match error {
                StartupError::Config(_) => BlinkPattern::default(),
                StartupError::Radio(_) => pattern,
            };
            FaultBlinker::new(link_led, delay, pattern)
        })
    }

    /// One cooperative loop iteration.
    ///
    /// Switches are sampled and the pending frame re-encoded every call. The
    /// battery check and the transmission each run only when their own
    /// period has elapsed. Both due activities run before any error is
    /// returned.
    pub fn poll(&mut self) -> Result<LoopReport, TransmitterError> {
        let now = self.clock.now_ms();

        let height = self.height_switch.read_ordinal();
        let mass = self.mass_switch.read_ordinal();
        let code = encode(height, mass);
        self.frame = frame::frame(code);

        self.stats.iterations = self.stats.iterations.saturating_add(1);
        if !code.is_valid() {
            self.stats.invalid_codes = self.stats.invalid_codes.saturating_add(1);
        }
        if self.config.diagnostics {
            info!(target: DIAGNOSTICS_TARGET, height, mass, "switch state");
        }

        let battery = if self.battery_timer.poll(now) {
            Some(self.check_battery())
        } else {
            None
        };
        let transmission = if self.telemetry_timer.poll(now) {
            Some(self.send_frame())
        } else {
            None
        };

        if let (Some(Err(_)), Some(outcome)) = (&battery, &transmission) {
            // Only the indicator error is returned; keep the send result visible.
            match outcome {
                Ok(outcome) => debug!(?outcome, "telemetry handled despite indicator fault"),
                Err(e) => warn!(error = %e, "telemetry send failed alongside indicator fault"),
            }
        }
        let battery = battery.transpose()?;
        let transmission = transmission.transpose()?;

        Ok(LoopReport {
            height,
            mass,
            code,
            battery: battery.map(|(state, _)| state),
            power_led_on: battery.map(|(_, lit)| lit),
            transmission,
        })
    }

    /// Poll forever. `idle` runs between iterations.
    pub fn run<F: FnMut()>(&mut self, mut idle: F) -> ! {
        loop {
            if let Err(e) = self.poll() {
                warn!(error = %e, "control loop iteration failed");
            }
            idle();
        }
    }

    fn check_battery(&mut self) -> Result<(BatteryState, bool), TransmitterError> {
        let state = self.battery.sample();

        self.stats.battery_checks = self.stats.battery_checks.saturating_add(1);
        if state.is_low {
            self.stats.low_battery_checks = self.stats.low_battery_checks.saturating_add(1);
            debug!(voltage = state.voltage, "battery low");
        }

        let lit = self.power_led.show(&state).map_err(TransmitterError::indicator)?;
        Ok((state, lit))
    }

    fn send_frame(&mut self) -> Result<TxOutcome, TransmitterError> {
        frame::write_frame(&self.frame, &mut self.packet)?;

        if self.config.diagnostics {
            let text = core::str::from_utf8(&self.packet).unwrap_or("<non-utf8>");
            info!(target: DIAGNOSTICS_TARGET, frame = text, "telemetry frame");
        }

        match self.radio.transmit(&self.packet) {
            Ok(()) => {
                self.stats.frames_sent = self.stats.frames_sent.saturating_add(1);
                Ok(TxOutcome::Sent)
            }
            Err(nb::Error::WouldBlock) => {
                self.stats.frames_dropped_busy = self.stats.frames_dropped_busy.saturating_add(1);
                debug!(code = %self.frame.height_mass_code, "radio busy, frame dropped");
                Ok(TxOutcome::Busy)
            }
            Err(nb::Error::Other(e)) => {
                self.stats.send_errors = self.stats.send_errors.saturating_add(1);
                Err(e.into())
            }
        }
    }

    pub fn pending_frame(&self) -> &TelemetryFrame {
        &self.frame
    }

    pub fn get_stats(&self) -> &TransmitterStats {
        &self.stats
    }

    pub fn get_config(&self) -> &TransmitterConfig {
        &self.config
    }

    pub fn battery_timer(&self) -> &PeriodicTimer {
        &self.battery_timer
    }

    pub fn telemetry_timer(&self) -> &PeriodicTimer {
        &self.telemetry_timer
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn power_led(&self) -> &L {
        self.power_led.led()
    }

    pub fn link_led(&self) -> &L {
        &self.link_led
    }
}
