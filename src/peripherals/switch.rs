use crate::encoder::{SwitchOrdinal, UNCLEAN_ORDINAL};
use embedded_hal::digital::{Error as _, InputPin};
use tracing::warn;

/// Anything that can report the current position of a multi-position selector.
pub trait SwitchReader {
    fn read_ordinal(&mut self) -> SwitchOrdinal;
}

/// Three-contact selector: one contact per position, active low.
///
/// Exactly one closed contact gives its index. No closed contact, more than
/// one, or a pin read error gives [`UNCLEAN_ORDINAL`].
#[derive(Debug)]
pub struct TriStateSwitch<P> {
    contacts: [P; 3],
}

impl<P: InputPin> TriStateSwitch<P> {
    /// Contacts in Low, Medium, High order.
    pub fn new(low: P, medium: P, high: P) -> Self {
        Self {
            contacts: [low, medium, high],
        }
    }

    pub fn release(self) -> [P; 3] {
        self.contacts
    }
}

impl<P: InputPin> SwitchReader for TriStateSwitch<P> {
    fn read_ordinal(&mut self) -> SwitchOrdinal {
        let mut closed: Option<SwitchOrdinal> = None;

        for (index, contact) in (0u8..).zip(self.contacts.iter_mut()) {
            match contact.is_low() {
                Ok(true) if closed.is_some() => return UNCLEAN_ORDINAL,
                Ok(true) => closed = Some(index),
                Ok(false) => {}
                Err(e) => {
                    warn!(contact = index, kind = ?e.kind(), "switch contact read failed");
                    return UNCLEAN_ORDINAL;
                }
            }
        }

        closed.unwrap_or(UNCLEAN_ORDINAL)
    }
}
