//! # Air-Cushion Remote Transmitter
//!
//! Control loop of a battery-powered handheld transmitter for an adaptive
//! air-cushion vehicle. Two three-position selectors (height and mass) are
//! folded into one command code that is radioed to the vehicle every
//! telemetry period, while the battery is watched on its own period.
//!
//! ## Quick Start
//!
//! ```rust
//! use cushion_remote::config::TransmitterConfig;
//! use cushion_remote::encoder::Position;
//! use cushion_remote::peripherals::sim::{SimBattery, SimClock, SimLed, SimRadio, SimSwitch};
//! use cushion_remote::peripherals::Peripherals;
//! use cushion_remote::Transmitter;
//!
//! let clock = SimClock::new();
//! let peripherals = Peripherals {
//!     height_switch: SimSwitch::new(Position::Low),
//!     mass_switch: SimSwitch::new(Position::High),
//!     battery: SimBattery::new(3.9),
//!     radio: SimRadio::new(),
//!     power_led: SimLed::new(false),
//!     link_led: SimLed::new(false),
//! };
//!
//! let mut transmitter = Transmitter::start(peripherals, clock.clone(), TransmitterConfig::default())
//!     .expect("radio present");
//!
//! clock.advance(500);
//! let report = transmitter.poll().unwrap();
//! assert_eq!(report.code.value(), 2);
//! assert_eq!(transmitter.radio().last_packet(), Some(&br#"{"height_mass_code":2}"#[..]));
//! ```
//!
//! ## Architecture
//!
//! - [`encoder`] - selector positions to command code
//! - [`frame`] - telemetry frame and packet serialization
//! - [`scheduler`] - clock abstraction and elapsed-time gates
//! - [`transmitter`] - application context and the control loop
//! - [`fault`] - fail-stop display after a radio bring-up failure
//! - [`peripherals`] - device traits, indicator policy and simulated hardware
//! - [`config`] - startup parameters

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod fault;
pub mod frame;
pub mod peripherals;
pub mod scheduler;
pub mod transmitter;

// Re-export main public types for convenience
pub use encoder::{encode, CommandCode, Position};
pub use frame::TelemetryFrame;
pub use transmitter::Transmitter;
