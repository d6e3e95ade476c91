use core::fmt;
use serde::{Deserialize, Serialize};

/// Raw position index reported by a tri-state selector.
///
/// Clean readings are 0, 1 or 2. Anything else means the selector could not
/// be read as exactly one position.
pub type SwitchOrdinal = u8;

/// Ordinal reported when a selector shows no active contact or several at once.
pub const UNCLEAN_ORDINAL: SwitchOrdinal = 3;

const POSITIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Low,
    Medium,
    High,
}

impl Position {
    pub const ALL: [Position; POSITIONS] = [Position::Low, Position::Medium, Position::High];

    pub fn ordinal(self) -> SwitchOrdinal {
        match self {
            Position::Low => 0,
            Position::Medium => 1,
            Position::High => 2,
        }
    }

    pub fn from_ordinal(ordinal: SwitchOrdinal) -> Option<Self> {
        match ordinal {
            0 => Some(Position::Low),
            1 => Some(Position::Medium),
            2 => Some(Position::High),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Low => "L",
            Position::Medium => "M",
            Position::High => "H",
        };
        f.pad(name)
    }
}

/// Command sent to the cushion: joint state of the height and mass selectors.
///
/// Valid codes are 0..=8. [`CommandCode::INVALID`] (-1) means "no valid
/// command this cycle" and must not be read as cushion level zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandCode(i8);

impl CommandCode {
    pub const INVALID: CommandCode = CommandCode(-1);
    pub const MIN: CommandCode = CommandCode(0);
    pub const MAX: CommandCode = CommandCode(8);

    /// Accepts only values a receiver can legitimately see on air.
    pub fn from_raw(raw: i8) -> Option<Self> {
        match raw {
            -1..=8 => Some(CommandCode(raw)),
            _ => None,
        }
    }

    pub fn value(self) -> i8 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Recover the selector positions a valid code was built from.
    pub fn split(self) -> Option<(Position, Position)> {
        if !self.is_valid() {
            return None;
        }
        let raw = self.0 as u8;
        let height = Position::from_ordinal(raw / POSITIONS as u8)?;
        let mass = Position::from_ordinal(raw % POSITIONS as u8)?;
        Some((height, mass))
    }
}

impl Default for CommandCode {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Row-major: height selects the row, mass the column.
const CODE_TABLE: [[CommandCode; POSITIONS]; POSITIONS] = [
    [CommandCode(0), CommandCode(1), CommandCode(2)],
    [CommandCode(3), CommandCode(4), CommandCode(5)],
    [CommandCode(6), CommandCode(7), CommandCode(8)],
];

/// Combine the two selector readings into one command code.
///
/// Pure and total: every pair of ordinals yields a code, out-of-range
/// ordinals yield [`CommandCode::INVALID`].
pub fn encode(height: SwitchOrdinal, mass: SwitchOrdinal) -> CommandCode {
    CODE_TABLE
        .get(usize::from(height))
        .and_then(|row| row.get(usize::from(mass)))
        .copied()
        .unwrap_or(CommandCode::INVALID)
}

/// Typed convenience over [`encode`]; always valid.
pub fn encode_positions(height: Position, mass: Position) -> CommandCode {
    let code = encode(height.ordinal(), mass.ordinal());
    debug_assert!(code.is_valid(), "clean positions {height}/{mass} produced invalid code");
    code
}
