//! Flat, case-insensitive key/value storage shared by every provider.

use std::collections::BTreeMap;

/// Separator between path segments of a flat configuration key.
pub const KEY_DELIMITER: &str = ":";

/// Joins path segments into a flat key (`Section:Parameter`).
pub fn combine_key(parent: &str, name: &str) -> String {
    format!("{parent}{KEY_DELIMITER}{name}")
}

/// Flat configuration mapping with case-insensitive keys.
///
/// Lookups ignore case, while enumeration yields the casing of the most
/// recent write for each key. Inserting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    entries: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
}

impl ConfigData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let entry = Entry {
            value: value.into(),
            key: key.clone(),
        };
        self.entries
            .insert(fold(&key), entry)
            .map(|previous| previous.value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|e| e.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries ordered by their case-folded key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|e| (e.key.as_str(), e.value.as_str()))
    }

    /// Copies every entry of `other` over this mapping.
    pub fn merge(&mut self, other: &ConfigData) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = ConfigData::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}

fn fold(key: &str) -> String {
    key.to_lowercase()
}
