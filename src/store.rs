//! Durable UID-to-alias mapping
//!
//! Persisted as a flat JSON object in the style of
//! `{"04A1B2C3": "Badge7"}`. Keys are folded to uppercase on load and
//! insert so lookups are case-insensitive; one alias per UID, last write
//! wins.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};

/// In-memory mapping from card UID to operator-assigned alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AliasStore {
    entries: HashMap<String, String>,
}

impl AliasStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from a JSON file
    ///
    /// A missing file is an empty store, not an error. A leading byte-order
    /// marker is tolerated. Malformed JSON is returned as
    /// [`Error::Store`]; callers typically log it and fall back to an empty
    /// store.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        let store: Self = serde_json::from_str(raw).map_err(Error::Store)?;
        Ok(store.normalized())
    }

    /// Save the store to a JSON file, keys sorted, human-readable
    pub fn save(&self, path: &Path) -> Result<()> {
        let ordered: BTreeMap<&str, &str> = self
            .entries
            .iter()
            .map(|(uid, alias)| (uid.as_str(), alias.as_str()))
            .collect();

        let mut json = serde_json::to_string_pretty(&ordered).map_err(Error::Store)?;
        json.push('\n');

        fs::write(path, json)?;
        Ok(())
    }

    /// Look up the alias for a UID, case-insensitively
    pub fn resolve(&self, uid: &str) -> Option<&str> {
        self.entries.get(&uid.to_uppercase()).map(String::as_str)
    }

    /// Bind an alias to a UID, replacing any previous binding
    pub fn insert(&mut self, uid: &str, alias: impl Into<String>) {
        self.entries.insert(uid.to_uppercase(), alias.into());
    }

    /// Number of stored aliases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no aliases
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold all keys to uppercase
    fn normalized(self) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(uid, alias)| (uid.to_uppercase(), alias))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut store = AliasStore::new();
        store.insert("04a1b2c3", "Badge7");

        assert_eq!(store.resolve("04A1B2C3"), Some("Badge7"));
        assert_eq!(store.resolve("04a1b2c3"), Some("Badge7"));
        assert_eq!(store.resolve("04A1b2C3"), Some("Badge7"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut store = AliasStore::new();
        store.insert("AABBCC", "Door");

        assert_eq!(store.resolve("aabbcc"), Some("Door"));
        assert_eq!(store.resolve("aabbcc"), Some("Door"));
    }

    #[test]
    fn last_write_wins() {
        let mut store = AliasStore::new();
        store.insert("AABBCC", "First");
        store.insert("aabbcc", "Second");

        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve("AABBCC"), Some("Second"));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = AliasStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(AliasStore::load(&path), Err(Error::Store(_))));
    }

    #[test]
    fn load_tolerates_byte_order_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        fs::write(&path, "\u{feff}{\"04a1b2c3\": \"Badge7\"}").unwrap();

        let store = AliasStore::load(&path).unwrap();
        assert_eq!(store.resolve("04A1B2C3"), Some("Badge7"));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");

        let mut store = AliasStore::new();
        store.insert("04A1B2C3", "Badge7");
        store.insert("deadbeef", "Spare");
        store.save(&path).unwrap();

        let reloaded = AliasStore::load(&path).unwrap();
        assert_eq!(reloaded, store);
    }

    #[test]
    fn save_orders_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");

        let mut store = AliasStore::new();
        store.insert("FF00", "Last");
        store.insert("0001", "First");
        store.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let first = raw.find("0001").unwrap();
        let last = raw.find("FF00").unwrap();
        assert!(first < last);
    }
}
