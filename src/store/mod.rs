//! Writable XML configuration store with debounced reload on change.
//!
//! Maps a nested XML document to a flat key-path to value mapping, keeps it
//! safe for concurrent readers and writers, persists point writes back to
//! the document while preserving CDATA sections, and reloads automatically
//! when the backing file changes on disk.

mod error;
mod events;
mod file_lock;
mod file_watcher;
mod file_watching;
mod loader;
mod saver;
mod snapshot;
mod source;
mod store;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, Result};
pub use events::ReloadEvent;
pub use source::{ConfigurationProvider, XmlConfigSource};
pub use store::XmlConfigStore;
