//! Tracking of currently-inserted cards
//!
//! Pairs a removal event with the alias resolved at insertion time. The
//! transport does not guarantee a stable per-card handle across insert and
//! remove, so the (reader, ATR) pair is only a provisional key; when a
//! removal does not match any tracked signature the tracker falls back to
//! the record of the card most recently inserted on the same reader. That
//! fallback is approximate pairing, not exact: on rapid multi-card swaps it
//! can misattribute the alias.

use std::collections::HashMap;

/// Provisional identity of an inserted card: reader name plus the ATR
/// observed at insertion
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardSignature {
    /// Reader name
    pub reader: String,
    /// Answer-to-reset byte sequence
    pub atr: Vec<u8>,
}

impl CardSignature {
    /// Create a signature
    pub fn new(reader: impl Into<String>, atr: impl Into<Vec<u8>>) -> Self {
        Self {
            reader: reader.into(),
            atr: atr.into(),
        }
    }
}

/// Snapshot taken when an insertion was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    /// UID read at insertion, if the card was readable
    pub uid: Option<String>,
    /// Alias resolved at insertion
    pub alias: String,
}

/// Outcome of pairing a removal event with a tracked insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The removal matched a tracked signature exactly
    Exact(PresenceRecord),
    /// No exact match; this is the record of the card most recently inserted
    /// on the same reader
    Fallback(PresenceRecord),
    /// Nothing tracked for this reader at all
    Unknown,
}

/// Set of currently-inserted cards, keyed by card signature
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    /// Records for exactly-tracked signatures
    records: HashMap<CardSignature, PresenceRecord>,
    /// Last record inserted per reader. Deliberately left in place after
    /// removals as a stale fallback.
    last_by_reader: HashMap<String, PresenceRecord>,
}

impl PresenceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved insertion
    pub fn record_insertion(&mut self, signature: CardSignature, record: PresenceRecord) {
        self.last_by_reader
            .insert(signature.reader.clone(), record.clone());
        self.records.insert(signature, record);
    }

    /// Pair a removal event with a tracked insertion
    ///
    /// An exact signature match removes and returns the record. Otherwise
    /// the per-reader fallback record is cloned and left in place.
    pub fn resolve_removal(&mut self, signature: &CardSignature) -> Removal {
        if let Some(record) = self.records.remove(signature) {
            return Removal::Exact(record);
        }

        match self.last_by_reader.get(&signature.reader) {
            Some(record) => Removal::Fallback(record.clone()),
            None => Removal::Unknown,
        }
    }

    /// Number of exactly-tracked cards
    pub fn tracked(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, alias: &str) -> PresenceRecord {
        PresenceRecord {
            uid: Some(uid.to_owned()),
            alias: alias.to_owned(),
        }
    }

    #[test]
    fn exact_removal_returns_insertion_snapshot() {
        let mut tracker = PresenceTracker::new();
        let sig = CardSignature::new("ACR122U", vec![0x3B, 0x81]);

        tracker.record_insertion(sig.clone(), record("04A1B2C3", "Badge7"));

        assert_eq!(
            tracker.resolve_removal(&sig),
            Removal::Exact(record("04A1B2C3", "Badge7"))
        );
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn unmatched_removal_falls_back_to_last_inserted_on_reader() {
        let mut tracker = PresenceTracker::new();
        tracker.record_insertion(
            CardSignature::new("ACR122U", vec![0x01]),
            record("AAAA", "First"),
        );
        tracker.record_insertion(
            CardSignature::new("ACR122U", vec![0x02]),
            record("BBBB", "Second"),
        );

        // Transport lost the signature on removal
        let unmatched = CardSignature::new("ACR122U", Vec::new());
        assert_eq!(
            tracker.resolve_removal(&unmatched),
            Removal::Fallback(record("BBBB", "Second"))
        );
    }

    #[test]
    fn fallback_record_is_left_in_place() {
        let mut tracker = PresenceTracker::new();
        tracker.record_insertion(
            CardSignature::new("ACR122U", vec![0x01]),
            record("AAAA", "First"),
        );

        let unmatched = CardSignature::new("ACR122U", Vec::new());
        assert_eq!(
            tracker.resolve_removal(&unmatched),
            Removal::Fallback(record("AAAA", "First"))
        );
        // Stale fallback survives, a second unmatched removal pairs again
        assert_eq!(
            tracker.resolve_removal(&unmatched),
            Removal::Fallback(record("AAAA", "First"))
        );
    }

    #[test]
    fn removal_on_untracked_reader_is_unknown() {
        let mut tracker = PresenceTracker::new();
        tracker.record_insertion(
            CardSignature::new("ACR122U", vec![0x01]),
            record("AAAA", "First"),
        );

        let other_reader = CardSignature::new("OMNIKEY", vec![0x01]);
        assert_eq!(tracker.resolve_removal(&other_reader), Removal::Unknown);
    }

    #[test]
    fn per_reader_fallbacks_are_independent() {
        let mut tracker = PresenceTracker::new();
        tracker.record_insertion(
            CardSignature::new("ACR122U", vec![0x01]),
            record("AAAA", "Left"),
        );
        tracker.record_insertion(
            CardSignature::new("OMNIKEY", vec![0x02]),
            record("BBBB", "Right"),
        );

        assert_eq!(
            tracker.resolve_removal(&CardSignature::new("OMNIKEY", Vec::new())),
            Removal::Fallback(record("BBBB", "Right"))
        );
        assert_eq!(
            tracker.resolve_removal(&CardSignature::new("ACR122U", Vec::new())),
            Removal::Fallback(record("AAAA", "Left"))
        );
    }
}
