use std::collections::HashMap;

use super::error::{ConfigError, Result};

/// Delimiter separating the segments of a hierarchical key path.
pub(crate) const KEY_DELIMITER: &str = ":";

/// Root element name used before any document has been loaded.
pub(crate) const DEFAULT_ROOT_NAME: &str = "configuration";

/// Deepest element nesting the loader and saver will process.
pub(crate) const MAX_DEPTH: usize = 128;

/// A single configuration value together with its serialization mode.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    /// Key path in the casing of its first writer.
    pub key: String,
    /// Stored value; absent values serialize as the empty string.
    pub value: Option<String>,
    /// Serialize the value inside a CDATA section instead of escaped text.
    pub raw_block: bool,
}

/// The complete in-memory state of a store at one instant.
///
/// Entries keep their insertion order for serialization; lookups go through
/// an index keyed by the normalized key path.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    root_name: String,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_NAME)
    }
}

impl Snapshot {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn set_root_name(&mut self, name: &str) {
        self.root_name = name.to_string();
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.index.get(&normalize(key)).map(|&i| &self.entries[i])
    }

    /// Writes a value, keeping the raw-block flag of an existing entry.
    /// A key never seen before starts out as escaped text.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.index.get(&normalize(key)) {
            Some(&i) => self.entries[i].value = Some(value.to_string()),
            None => self.push_entry(key, Some(value.to_string()), false),
        }
    }

    /// Writes a value that must be serialized as a CDATA section.
    pub fn set_raw(&mut self, key: &str, value: &str) {
        match self.index.get(&normalize(key)) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.value = Some(value.to_string());
                entry.raw_block = true;
            }
            None => self.push_entry(key, Some(value.to_string()), true),
        }
    }

    /// Inserts an entry parsed from a document. Returns `false` when the
    /// normalized key is already present.
    pub fn insert_new(&mut self, key: &str, value: Option<String>, raw_block: bool) -> bool {
        if self.index.contains_key(&normalize(key)) {
            return false;
        }
        self.push_entry(key, value, raw_block);
        true
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push_entry(&mut self, key: &str, value: Option<String>, raw_block: bool) {
        self.index.insert(normalize(key), self.entries.len());
        self.entries.push(Entry {
            key: key.to_string(),
            value,
            raw_block,
        });
    }
}

/// Normalized form used for key comparison. Key paths are case-insensitive.
pub(crate) fn normalize(key: &str) -> String {
    key.to_lowercase()
}

/// Checks that every segment of a key path can be used as an element name.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.split(KEY_DELIMITER).all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c == '_' || c.is_alphabetic())
                && chars.all(|c| c == '_' || c == '-' || c == '.' || c.is_alphanumeric())
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfiguration {
            details: format!("key '{key}' cannot be expressed as a chain of element names"),
        })
    }
}
