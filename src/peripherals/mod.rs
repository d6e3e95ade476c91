pub mod battery;
pub mod indicator;
pub mod radio;
pub mod sim;
pub mod switch;

pub use battery::{BatteryMonitor, BatteryState, VoltageDivider, VoltageSensor};
pub use indicator::PowerIndicator;
pub use radio::RadioLink;
pub use switch::{SwitchReader, TriStateSwitch};

/// Every device handle the transmitter owns, handed over once at startup.
#[derive(Debug)]
pub struct Peripherals<SW, V, R, L> {
    pub height_switch: SW,
    pub mass_switch: SW,
    pub battery: V,
    pub radio: R,
    pub power_led: L,
    pub link_led: L,
}
