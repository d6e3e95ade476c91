use crate::error::RadioError;

/// Outbound half of a long-range packet radio.
///
/// `transmit` hands one complete packet to the transceiver and returns
/// without waiting for it to go on air. `WouldBlock` means the previous
/// packet is still being sent and nothing was queued.
pub trait RadioLink {
    /// One-shot bring-up. Called exactly once at startup.
    fn init(&mut self, frequency_hz: u32) -> Result<(), RadioError>;

    fn transmit(&mut self, payload: &[u8]) -> nb::Result<(), RadioError>;
}
