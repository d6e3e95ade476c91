use cushion_remote::config::TransmitterConfig;
use cushion_remote::encoder::{CommandCode, Position, UNCLEAN_ORDINAL};
use cushion_remote::error::{ConfigError, RadioError, StartupError, TransmitterError};
use cushion_remote::fault::{BlinkPattern, FaultBlinker};
use cushion_remote::peripherals::sim::{SimBattery, SimClock, SimDelay, SimLed, SimRadio, SimSwitch};
use cushion_remote::peripherals::Peripherals;
use cushion_remote::transmitter::{StartupFault, Transmitter, TxOutcome};
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type SimTransmitter = Transmitter<SimSwitch, SimBattery, SimRadio, SimLed, SimClock>;

struct Rig {
    clock: SimClock,
    height: SimSwitch,
    mass: SimSwitch,
    battery: SimBattery,
    power_led: SimLed,
    link_led: SimLed,
}

fn wire_rig(radio: SimRadio, volts: f32) -> (Rig, Peripherals<SimSwitch, SimBattery, SimRadio, SimLed>) {
    let rig = Rig {
        clock: SimClock::new(),
        height: SimSwitch::new(Position::Low),
        mass: SimSwitch::new(Position::Low),
        battery: SimBattery::new(volts),
        power_led: SimLed::new(false),
        link_led: SimLed::new(false),
    };
    let peripherals = Peripherals {
        height_switch: rig.height.clone(),
        mass_switch: rig.mass.clone(),
        battery: rig.battery.clone(),
        radio,
        power_led: rig.power_led.clone(),
        link_led: rig.link_led.clone(),
    };
    (rig, peripherals)
}

fn boot_rig(
    radio: SimRadio,
    volts: f32,
    config: TransmitterConfig,
) -> (Rig, Result<SimTransmitter, StartupFault<SimLed>>) {
    let (rig, peripherals) = wire_rig(radio, volts);
    let result = Transmitter::start(peripherals, rig.clock.clone(), config);
    (rig, result)
}

/// Startup the way `boot` does it, stopping short of the endless blink.
fn fault_rig(radio: SimRadio, config: TransmitterConfig) -> (Rig, FaultBlinker<SimLed, SimDelay>) {
    let (rig, peripherals) = wire_rig(radio, 3.9);
    match Transmitter::start_or_fault(peripherals, rig.clock.clone(), SimDelay::new(), config) {
        Ok(_) => panic!("startup was expected to fail"),
        Err(blinker) => (rig, blinker),
    }
}

fn running(volts: f32) -> (Rig, SimTransmitter) {
    let (rig, result) = boot_rig(SimRadio::new(), volts, TransmitterConfig::default());
    (rig, result.expect("simulated radio initializes"))
}

#[cfg(test)]
mod startup_tests {
    use super::*;

    #[test]
    fn test_startup_lights_both_leds_and_tunes_radio() {
        let (rig, transmitter) = running(3.9);

        assert!(rig.power_led.is_lit());
        assert!(rig.link_led.is_lit());
        assert_eq!(transmitter.radio().frequency_hz(), Some(868_000_000));
        assert_eq!(transmitter.radio().sent_count(), 0);
    }

    #[test]
    fn test_absent_radio_reports_init_failure() {
        let (_rig, result) = boot_rig(SimRadio::absent(), 3.9, TransmitterConfig::default());

        let fault = match result {
            Ok(_) => panic!("absent radio must not start the control loop"),
            Err(fault) => fault,
        };
        assert!(matches!(
            fault.error,
            StartupError::Radio(RadioError::InitFailed { frequency_hz: 868_000_000 })
        ));
    }

    #[test]
    fn test_radio_failure_is_fail_stop() {
        let (rig, mut blinker) = fault_rig(SimRadio::absent(), TransmitterConfig::default());
        assert_eq!(blinker.pattern(), BlinkPattern { on_ms: 200, off_ms: 1000 });

        assert_eq!(blinker.run(Some(4)), 0);

        let delays: Vec<u32> = blinker.delay().recent_ms().collect();
        assert_eq!(delays, vec![200, 1000, 200, 1000, 200, 1000, 200, 1000]);
        assert!(!rig.link_led.is_lit());
        // Lit at startup, then one off/on/off/on/off run per cycle
        assert_eq!(rig.link_led.transitions(), 1 + 7);
    }

    #[test]
    fn test_fault_display_uses_configured_pattern() {
        let config = TransmitterConfig {
            fault_blink_on_ms: 50,
            fault_blink_off_ms: 300,
            ..TransmitterConfig::default()
        };
        let (_rig, mut blinker) = fault_rig(SimRadio::absent(), config);

        blinker.run(Some(2));
        let delays: Vec<u32> = blinker.delay().recent_ms().collect();
        assert_eq!(delays, vec![50, 300, 50, 300]);
    }

    #[test]
    fn test_zero_telemetry_period_is_refused() {
        let config = TransmitterConfig {
            telemetry_period_ms: 0,
            ..TransmitterConfig::default()
        };
        let (rig, result) = boot_rig(SimRadio::new(), 3.9, config);

        let fault = match result {
            Ok(_) => panic!("a zero period must not start the control loop"),
            Err(fault) => fault,
        };
        assert!(matches!(
            fault.error,
            StartupError::Config(ConfigError::Invalid { field: "telemetry_period_ms", .. })
        ));
        // Rejected before any device is touched
        assert!(!rig.power_led.is_lit());
        assert!(!rig.link_led.is_lit());
    }

    #[test]
    fn test_rejected_config_blinks_default_pattern() {
        let config = TransmitterConfig {
            battery_check_period_ms: 0,
            fault_blink_on_ms: 0,
            ..TransmitterConfig::default()
        };
        let (_rig, mut blinker) = fault_rig(SimRadio::new(), config);

        assert_eq!(blinker.pattern(), BlinkPattern::default());
        blinker.run(Some(1));
        assert_eq!(blinker.delay().total_ms(), 1200);
    }
}

#[cfg(test)]
mod battery_indicator_tests {
    use super::*;

    #[test]
    fn test_low_battery_blinks_power_led() {
        let (rig, mut transmitter) = running(3.1);
        let mut levels = Vec::new();

        for _ in 0..4 {
            rig.clock.advance(500);
            let report = transmitter.poll().unwrap();
            assert!(report.battery.unwrap().is_low);
            levels.push(report.power_led_on.unwrap());
            assert_eq!(rig.power_led.is_lit(), *levels.last().unwrap());
        }

        assert_eq!(levels, vec![false, true, false, true]);
        assert_eq!(transmitter.get_stats().low_battery_checks, 4);
    }

    #[test]
    fn test_healthy_battery_holds_power_led_on() {
        let (rig, mut transmitter) = running(3.9);
        let transitions_after_start = rig.power_led.transitions();

        for _ in 0..4 {
            rig.clock.advance(500);
            let report = transmitter.poll().unwrap();
            assert_eq!(report.power_led_on, Some(true));
            assert!(rig.power_led.is_lit());
        }
        assert_eq!(rig.power_led.transitions(), transitions_after_start);
    }

    #[test]
    fn test_threshold_voltage_is_not_low() {
        let (rig, mut transmitter) = running(3.4);
        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();
        assert!(!report.battery.unwrap().is_low);
        assert_eq!(report.power_led_on, Some(true));
    }

    #[test]
    fn test_recovery_restores_solid_on_at_next_check() {
        let (rig, mut transmitter) = running(3.1);

        rig.clock.advance(500);
        transmitter.poll().unwrap();
        assert!(!rig.power_led.is_lit());

        rig.battery.set_voltage(3.8);
        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.power_led_on, Some(true));
    }

    #[test]
    fn test_battery_not_sampled_between_checks() {
        let (rig, mut transmitter) = running(3.1);
        rig.clock.advance(499);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.battery, None);
        assert!(rig.power_led.is_lit());
    }
}

#[cfg(test)]
mod telemetry_tests {
    use super::*;

    #[test]
    fn test_frame_carries_current_switch_state() {
        let (rig, mut transmitter) = running(3.9);
        rig.height.set_position(Position::High);
        rig.mass.set_position(Position::Medium);

        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();

        assert_eq!(report.transmission, Some(TxOutcome::Sent));
        assert_eq!(report.code.value(), 7);
        assert_eq!(transmitter.radio().last_packet(), Some(&br#"{"height_mass_code":7}"#[..]));
    }

    #[test]
    fn test_switches_sampled_every_iteration() {
        let (rig, mut transmitter) = running(3.9);

        rig.clock.advance(100);
        rig.height.set_position(Position::Medium);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.transmission, None);
        assert_eq!(transmitter.pending_frame().height_mass_code.value(), 3);

        // Latest reading wins at transmit time
        rig.mass.set_position(Position::High);
        rig.clock.advance(400);
        transmitter.poll().unwrap();
        assert_eq!(transmitter.radio().last_packet(), Some(&br#"{"height_mass_code":5}"#[..]));
        assert_eq!(transmitter.radio().sent_count(), 1);
    }

    #[test]
    fn test_invalid_code_is_transmitted_as_is() {
        let (rig, mut transmitter) = running(3.9);
        rig.mass.set_ordinal(UNCLEAN_ORDINAL);

        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();

        assert_eq!(report.code, CommandCode::INVALID);
        assert_eq!(report.transmission, Some(TxOutcome::Sent));
        assert_eq!(transmitter.radio().last_packet(), Some(&br#"{"height_mass_code":-1}"#[..]));
        assert_eq!(transmitter.get_stats().invalid_codes, 1);
    }

    #[test]
    fn test_busy_radio_drops_frame_without_retry() {
        let (rig, mut transmitter) = running(3.9);
        transmitter.radio_mut().set_busy_for(1);

        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.transmission, Some(TxOutcome::Busy));
        assert_eq!(transmitter.radio().sent_count(), 0);
        assert_eq!(transmitter.telemetry_timer().last_fired_ms(), 500);

        // No retry on the next iteration
        rig.clock.advance(10);
        assert_eq!(transmitter.poll().unwrap().transmission, None);

        rig.clock.advance(490);
        assert_eq!(transmitter.poll().unwrap().transmission, Some(TxOutcome::Sent));
        assert_eq!(transmitter.get_stats().frames_dropped_busy, 1);
        assert_eq!(transmitter.get_stats().frames_sent, 1);
    }

    #[test]
    fn test_long_stall_fires_once_without_catch_up() {
        let (rig, mut transmitter) = running(3.9);

        rig.clock.advance(5_000);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.transmission, Some(TxOutcome::Sent));
        assert!(report.battery.is_some());

        let report = transmitter.poll().unwrap();
        assert_eq!(report.transmission, None);
        assert_eq!(report.battery, None);
        assert_eq!(transmitter.radio().sent_count(), 1);
    }

    #[test]
    fn test_steady_cadence_over_ten_seconds() {
        let (rig, mut transmitter) = running(3.9);

        for _ in 0..1000 {
            rig.clock.advance(10);
            transmitter.poll().unwrap();
        }

        let stats = transmitter.get_stats();
        assert_eq!(stats.iterations, 1000);
        assert_eq!(stats.frames_sent, 20);
        assert_eq!(stats.battery_checks, 20);
        assert_eq!(transmitter.radio().packets().count(), 8);
    }
}

#[cfg(test)]
mod timer_independence_tests {
    use super::*;

    #[test]
    fn test_battery_and_telemetry_timers_fire_independently() {
        let config = TransmitterConfig {
            battery_check_period_ms: 300,
            telemetry_period_ms: 500,
            ..TransmitterConfig::default()
        };
        let (rig, result) = boot_rig(SimRadio::new(), 3.9, config);
        let mut transmitter = result.unwrap();

        rig.clock.set(300);
        let report = transmitter.poll().unwrap();
        assert!(report.battery.is_some());
        assert_eq!(report.transmission, None);
        // Battery firing leaves the telemetry accounting alone
        assert_eq!(transmitter.telemetry_timer().last_fired_ms(), 0);
        assert_eq!(transmitter.telemetry_timer().elapsed_ms(300), 300);

        rig.clock.set(500);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.battery, None);
        assert_eq!(report.transmission, Some(TxOutcome::Sent));
        assert_eq!(transmitter.battery_timer().last_fired_ms(), 300);

        rig.clock.set(600);
        let report = transmitter.poll().unwrap();
        assert!(report.battery.is_some());
        assert_eq!(report.transmission, None);
        assert_eq!(transmitter.telemetry_timer().last_fired_ms(), 500);

        rig.clock.set(900);
        let report = transmitter.poll().unwrap();
        assert!(report.battery.is_some());
        assert_eq!(report.transmission, None);

        rig.clock.set(1000);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.battery, None);
        assert_eq!(report.transmission, Some(TxOutcome::Sent));
        assert_eq!(transmitter.battery_timer().get_stats().fired, 3);
        assert_eq!(transmitter.telemetry_timer().get_stats().fired, 2);
    }

    #[test]
    fn test_busy_radio_does_not_touch_battery_timer() {
        let (rig, mut transmitter) = running(3.9);
        transmitter.radio_mut().set_busy_for(5);

        rig.clock.advance(500);
        let report = transmitter.poll().unwrap();
        assert_eq!(report.transmission, Some(TxOutcome::Busy));
        assert!(report.battery.is_some());
        assert_eq!(transmitter.battery_timer().last_fired_ms(), 500);
        assert_eq!(transmitter.battery_timer().get_stats().fired, 1);
    }
}

/// LED whose pin calls start failing once `broken` is set.
#[derive(Debug, Clone)]
struct FlakyLed {
    led: SimLed,
    broken: Arc<AtomicBool>,
}

impl FlakyLed {
    fn new(broken: Arc<AtomicBool>) -> Self {
        Self {
            led: SimLed::new(false),
            broken,
        }
    }

    fn check(&self) -> Result<(), ErrorKind> {
        if self.broken.load(Ordering::SeqCst) {
            Err(ErrorKind::Other)
        } else {
            Ok(())
        }
    }
}

impl ErrorType for FlakyLed {
    type Error = ErrorKind;
}

impl OutputPin for FlakyLed {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        self.check()?;
        self.led.set_low().map_err(|e| match e {})
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        self.check()?;
        self.led.set_high().map_err(|e| match e {})
    }
}

impl StatefulOutputPin for FlakyLed {
    fn is_set_high(&mut self) -> Result<bool, ErrorKind> {
        self.check()?;
        self.led.is_set_high().map_err(|e| match e {})
    }

    fn is_set_low(&mut self) -> Result<bool, ErrorKind> {
        self.check()?;
        self.led.is_set_low().map_err(|e| match e {})
    }
}

#[cfg(test)]
mod loop_error_tests {
    use super::*;

    #[test]
    fn test_indicator_fault_does_not_skip_telemetry() {
        let broken = Arc::new(AtomicBool::new(false));
        let clock = SimClock::new();
        let peripherals = Peripherals {
            height_switch: SimSwitch::new(Position::Low),
            mass_switch: SimSwitch::new(Position::High),
            battery: SimBattery::new(3.9),
            radio: SimRadio::new(),
            power_led: FlakyLed::new(broken.clone()),
            link_led: FlakyLed::new(Arc::new(AtomicBool::new(false))),
        };
        let mut transmitter = Transmitter::start(peripherals, clock.clone(), TransmitterConfig::default()).unwrap();

        broken.store(true, Ordering::SeqCst);
        clock.advance(500);
        let error = match transmitter.poll() {
            Ok(_) => panic!("power LED fault must be reported"),
            Err(error) => error,
        };

        assert!(matches!(error, TransmitterError::Indicator(ErrorKind::Other)));
        // The frame due in the same iteration still went out
        assert_eq!(transmitter.radio().last_packet(), Some(&br#"{"height_mass_code":2}"#[..]));
        assert_eq!(transmitter.get_stats().frames_sent, 1);
        assert_eq!(transmitter.get_stats().battery_checks, 1);

        // Next check with a working pin recovers
        broken.store(false, Ordering::SeqCst);
        clock.advance(500);
        assert_eq!(transmitter.poll().unwrap().power_led_on, Some(true));
    }
}
