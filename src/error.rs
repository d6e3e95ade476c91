use embedded_hal::digital::ErrorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    #[error("radio did not respond during initialization at {frequency_hz} Hz")]
    InitFailed { frequency_hz: u32 },
    #[error("radio has not been initialized")]
    NotInitialized,
    #[error("payload of {len} bytes exceeds radio limit of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("transmit failed: {0}")]
    TransmitFailed(&'static str),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame does not fit into a {capacity} byte packet")]
    PacketOverflow { capacity: usize },
    #[error("frame serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("invalid frame payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("command code {0} out of range")]
    CodeOutOfRange(i64),
}

#[derive(Debug, Error)]
pub enum TransmitterError {
    #[error("indicator pin fault: {0:?}")]
    Indicator(ErrorKind),
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

impl TransmitterError {
    pub(crate) fn indicator<E: embedded_hal::digital::Error>(e: E) -> Self {
        TransmitterError::Indicator(e.kind())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Why the transmitter could not enter its control loop.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("rejected config: {0}")]
    Config(#[from] ConfigError),
    #[error("radio bring-up failed: {0}")]
    Radio(#[from] RadioError),
}
