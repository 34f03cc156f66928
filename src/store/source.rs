use std::path::PathBuf;

use super::error::Result;
use super::store::XmlConfigStore;

/// The key-value surface a configuration provider exposes to a
/// configuration-composition layer.
///
/// [`XmlConfigStore`] implements this trait; its raw-block writes, explicit
/// save and reload notifications are extensions on the concrete type.
pub trait ConfigurationProvider {
    /// Loads (or reloads) the provider's data from its source.
    ///
    /// # Errors
    /// Returns error if the source is missing, unreadable or malformed.
    fn load(&self) -> Result<()>;

    /// Returns the value stored under `key`, if present.
    fn try_get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns error if the key is invalid or the store is unavailable.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl ConfigurationProvider for XmlConfigStore {
    fn load(&self) -> Result<()> {
        XmlConfigStore::load(self)
    }

    fn try_get(&self, key: &str) -> Option<String> {
        XmlConfigStore::try_get(self, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        XmlConfigStore::set(self, key, value)
    }
}

/// Describes where a store's document lives and how the store behaves
/// around missing files and external edits.
#[derive(Debug, Clone)]
pub struct XmlConfigSource {
    pub(crate) path: PathBuf,
    pub(crate) optional: bool,
    pub(crate) reload_on_change: bool,
}

impl XmlConfigSource {
    /// Creates a source for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            optional: false,
            reload_on_change: false,
        }
    }

    /// Permits a missing file, which then loads as an empty store.
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Reloads the store automatically when the file changes on disk.
    ///
    /// Requires a running Tokio runtime when the store is built.
    #[must_use]
    pub fn reload_on_change(mut self, reload_on_change: bool) -> Self {
        self.reload_on_change = reload_on_change;
        self
    }

    /// Builds the store, performs the initial load and, when requested,
    /// starts watching the file for external changes.
    ///
    /// # Errors
    /// * `ConfigError::NotFound` - If the file is missing and the source is not optional
    /// * `ConfigError::Format` - If the document cannot be parsed
    /// * `ConfigError::Io` - If the file cannot be read
    /// * `ConfigError::WatchInit` / `ConfigError::Watch` - If change watching cannot start
    pub fn build(&self) -> Result<XmlConfigStore> {
        let store = XmlConfigStore::from_source(self);
        store.load()?;

        if self.reload_on_change {
            store.start_file_watching()?;
        }

        Ok(store)
    }
}
