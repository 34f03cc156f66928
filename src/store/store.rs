use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockWriteGuard};

use futures::Stream;
use tokio::sync::broadcast;
use tracing::debug;

use super::error::{ConfigError, Result};
use super::events::ReloadEvent;
use super::file_lock;
use super::file_watching::FileWatchHandle;
use super::loader;
use super::saver;
use super::snapshot::{self, Snapshot};
use super::source::XmlConfigSource;

/// A thread-safe, writable configuration store backed by an XML document.
///
/// Values are addressed by `:`-delimited key paths mirroring the element
/// nesting of the document, such as `logging:level`; key paths compare
/// case-insensitively. Any number of readers proceed in parallel while
/// writes and reloads are exclusive, and a reload swaps the whole snapshot
/// at once so readers observe either the old or the new state, never a mix.
///
/// Cloning is cheap and every clone shares the same snapshot.
#[derive(Clone)]
pub struct XmlConfigStore {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    pub(crate) data: RwLock<Snapshot>,
    pub(crate) path: PathBuf,
    pub(crate) optional: bool,
    pub(crate) reload_tx: broadcast::Sender<ReloadEvent>,
    pub(crate) watch: Mutex<Option<FileWatchHandle>>,
}

impl XmlConfigStore {
    /// Creates a store with no backing file and the default root name.
    ///
    /// Useful as a purely in-memory key-value store; `load` and `save`
    /// fail until a backing path is configured through a source.
    pub fn empty() -> Self {
        Self::with_path(PathBuf::new(), true)
    }

    pub(crate) fn from_source(source: &XmlConfigSource) -> Self {
        Self::with_path(source.path.clone(), source.optional)
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    fn with_path(path: PathBuf, optional: bool) -> Self {
        let (reload_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(StoreInner {
                data: RwLock::new(Snapshot::default()),
                path,
                optional,
                reload_tx,
                watch: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Arc<StoreInner> {
        &self.inner
    }

    /// Returns the value stored under `key`, if present.
    ///
    /// An entry carrying no value reads as the empty string.
    pub fn try_get(&self, key: &str) -> Option<String> {
        let data = match self.inner.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.get(key)
            .map(|entry| entry.value.clone().unwrap_or_default())
    }

    /// Stores `value` under `key`.
    ///
    /// An existing entry keeps its serialization mode; a key never seen
    /// before is stored as ordinary escaped text.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If the key cannot be expressed as element names
    /// * `ConfigError::Lock` - If the snapshot lock is poisoned
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        snapshot::validate_key(key)?;
        let mut data = self.write_data()?;
        data.set(key, value);
        Ok(())
    }

    /// Stores `value` under `key`, forcing serialization as a CDATA section.
    ///
    /// The raw marking is sticky: later plain [`set`](Self::set) calls on
    /// the same key keep serializing as CDATA.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If the key cannot be expressed as element names
    /// * `ConfigError::Lock` - If the snapshot lock is poisoned
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        snapshot::validate_key(key)?;
        let mut data = self.write_data()?;
        data.set_raw(key, value);
        Ok(())
    }

    /// Name of the document's outer element.
    pub fn root_name(&self) -> String {
        let data = match self.inner.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        data.root_name().to_string()
    }

    /// Renames the document's outer element.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If the name is empty or whitespace
    /// * `ConfigError::Lock` - If the snapshot lock is poisoned
    pub fn set_root_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                details: "root element name must not be empty".to_string(),
            });
        }
        let mut data = self.write_data()?;
        data.set_root_name(name);
        Ok(())
    }

    /// Reloads the snapshot from the backing file, replacing it wholesale.
    ///
    /// A missing file produces a fresh empty snapshot when the source is
    /// optional. File access is serialized with every other store in the
    /// process pointed at the same path, and the data lock is only taken
    /// for the final swap.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If no backing path is set
    /// * `ConfigError::NotFound` - If the file is missing and not optional
    /// * `ConfigError::Format` - If the document cannot be parsed
    /// * `ConfigError::Io` - If the file cannot be read
    pub fn load(&self) -> Result<()> {
        let path = self.backing_path()?;

        let content = {
            let lock = file_lock::for_path(path);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match fs::read_to_string(path) {
                Ok(content) => Some(content),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
                Err(error) => {
                    return Err(ConfigError::Io {
                        path: path.clone(),
                        details: error.to_string(),
                    });
                }
            }
        };

        let snapshot = match content {
            Some(content) => loader::parse_document(&content)?,
            None if self.inner.optional => Snapshot::default(),
            None => {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
        };

        debug!(
            path = %path.display(),
            entries = snapshot.len(),
            "loaded configuration snapshot"
        );
        self.replace_snapshot(snapshot);
        Ok(())
    }

    /// Loads a snapshot from an arbitrary reader, replacing the current one.
    ///
    /// # Errors
    /// * `ConfigError::Io` - If the reader fails
    /// * `ConfigError::Format` - If the document cannot be parsed
    pub fn load_from(&self, mut reader: impl Read) -> Result<()> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|error| ConfigError::Io {
                path: self.inner.path.clone(),
                details: error.to_string(),
            })?;

        let snapshot = loader::parse_document(&content)?;
        self.replace_snapshot(snapshot);
        Ok(())
    }

    /// Persists the current snapshot to the backing file.
    ///
    /// The snapshot is copied under the read lock and serialized after the
    /// lock is released, so slow disks never block readers or writers.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If no backing path is set
    /// * `ConfigError::Format` - If the snapshot cannot be serialized
    /// * `ConfigError::Io` - If the file cannot be written
    pub fn save(&self) -> Result<()> {
        let path = self.backing_path()?;

        let snapshot = {
            let data = match self.inner.data.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            data.clone()
        };

        let lock = file_lock::for_path(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        saver::write_to_file(&snapshot, path)?;
        debug!(
            path = %path.display(),
            entries = snapshot.len(),
            "saved configuration snapshot"
        );
        Ok(())
    }

    /// Creates a stream of notifications fired after each completed
    /// external-change reload.
    pub fn reload_events(&self) -> impl Stream<Item = ReloadEvent> {
        let receiver = self.inner.reload_tx.subscribe();

        futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    /// Stops watching the backing file, releasing the change subscription
    /// and cancelling any pending debounced reload.
    pub fn close(&self) {
        let handle = {
            let mut watch = self.inner.watch.lock().unwrap_or_else(PoisonError::into_inner);
            watch.take()
        };
        drop(handle);
    }

    pub(crate) fn backing_path(&self) -> Result<&PathBuf> {
        if self.inner.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                details: "no backing file path is configured".to_string(),
            });
        }
        Ok(&self.inner.path)
    }

    pub(crate) fn replace_snapshot(&self, snapshot: Snapshot) {
        let mut data = match self.inner.data.write() {
            Ok(guard) => guard,
            // The swap overwrites whatever a panicked writer left behind.
            Err(poisoned) => poisoned.into_inner(),
        };
        *data = snapshot;
    }

    fn write_data(&self) -> Result<RwLockWriteGuard<'_, Snapshot>> {
        self.inner.data.write().map_err(|_| ConfigError::Lock {
            lock_type: "write".to_string(),
            details: "snapshot lock poisoned by a panicked writer".to_string(),
        })
    }
}
