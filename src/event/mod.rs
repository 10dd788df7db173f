//! Event types and channel handling for card monitoring

pub mod channel;
pub use channel::*;

/// Events related to card insertion/removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    /// Card was inserted into a reader
    Inserted {
        /// Reader name
        reader: String,
        /// ATR of the inserted card
        atr: Vec<u8>,
    },
    /// Card was removed from a reader
    Removed {
        /// Reader name
        reader: String,
        /// ATR captured while the card was last seen present. Empty when the
        /// card was never observed inserted, in which case removal pairing
        /// relies on the per-reader fallback.
        atr: Vec<u8>,
    },
}

impl CardEvent {
    /// Name of the reader this event originated from
    pub fn reader(&self) -> &str {
        match self {
            Self::Inserted { reader, .. } | Self::Removed { reader, .. } => reader,
        }
    }
}
