use crate::encoder::CommandCode;
use crate::error::FrameError;
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// LoRa maximum payload length.
pub const MAX_PACKET_SIZE: usize = 255;

/// Longest frame that can ever be produced.
const WIDEST_FRAME: &str = r#"{"height_mass_code":-1}"#;

const_assert!(MAX_PACKET_SIZE <= u8::MAX as usize);
const_assert!(WIDEST_FRAME.len() <= MAX_PACKET_SIZE);

/// Outbound packet buffer. Holds exactly one serialized frame.
pub type Packet = ArrayVec<u8, MAX_PACKET_SIZE>;

/// The single-field payload transmitted every telemetry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TelemetryFrame {
    pub height_mass_code: CommandCode,
}

// Receivers accept only the one known key and the on-air code range.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireFrame {
    height_mass_code: i64,
}

pub fn frame(code: CommandCode) -> TelemetryFrame {
    TelemetryFrame { height_mass_code: code }
}

/// Serialize `frame` as the entire payload of `packet`.
///
/// The packet is cleared first. On failure it is left empty so a partial
/// frame can never be handed to the radio.
pub fn write_frame<const N: usize>(
    frame: &TelemetryFrame,
    packet: &mut ArrayVec<u8, N>,
) -> Result<(), FrameError> {
    packet.clear();
    if let Err(e) = serde_json::to_writer(&mut *packet, frame) {
        packet.clear();
        return Err(if e.is_io() {
            FrameError::PacketOverflow { capacity: N }
        } else {
            FrameError::Serialization(e)
        });
    }
    Ok(())
}

pub fn decode_frame(payload: &[u8]) -> Result<TelemetryFrame, FrameError> {
    let wire: WireFrame = serde_json::from_slice(payload).map_err(FrameError::Decode)?;
    let code = i8::try_from(wire.height_mass_code)
        .ok()
        .and_then(CommandCode::from_raw)
        .ok_or(FrameError::CodeOutOfRange(wire.height_mass_code))?;
    Ok(frame(code))
}
