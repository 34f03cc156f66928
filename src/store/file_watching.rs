use std::sync::{Arc, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::error::{ConfigError, Result};
use super::events::ReloadEvent;
use super::file_watcher::{FileEvent, FileWatcher};
use super::store::{StoreInner, XmlConfigStore};

/// Quiet period a burst of change notifications must end with before a
/// single reload runs.
pub(crate) const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// Owns the change subscription and the debounce task for one store.
///
/// Dropping the handle aborts the task and releases the notify
/// subscription; the task would also stop on its own once the event
/// channel closes or the owning store is gone.
pub(crate) struct FileWatchHandle {
    _watcher: FileWatcher,
    task: JoinHandle<()>,
}

impl Drop for FileWatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl XmlConfigStore {
    /// Starts monitoring the backing file and reloading on external changes.
    ///
    /// Bursts of notifications closer together than 500 ms coalesce into a
    /// single reload; each completed reload emits one event on the stream
    /// returned by [`XmlConfigStore::reload_events`]. A failed background
    /// reload is logged and leaves the current snapshot intact.
    ///
    /// Watching stops when [`XmlConfigStore::close`] is called or the last
    /// clone of the store is dropped. Must be called from within a Tokio
    /// runtime; calling it again replaces the previous watch.
    ///
    /// # Errors
    /// * `ConfigError::InvalidConfiguration` - If no backing path is set
    /// * `ConfigError::WatchInit` - If no runtime is running or the watcher cannot be created
    /// * `ConfigError::Watch` - If the backing path cannot be monitored
    pub fn start_file_watching(&self) -> Result<()> {
        let path = self.backing_path()?.clone();

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ConfigError::WatchInit {
                details: "file watching requires a running Tokio runtime".to_string(),
            }
        })?;

        let (mut watcher, event_rx) =
            FileWatcher::new(&path).map_err(|error| ConfigError::WatchInit {
                details: error.to_string(),
            })?;
        watcher.watch().map_err(|error| ConfigError::Watch {
            path: path.clone(),
            details: error.to_string(),
        })?;

        let task = spawn_debounce_loop(&runtime, Arc::downgrade(self.inner()), event_rx);
        let handle = FileWatchHandle {
            _watcher: watcher,
            task,
        };

        let mut watch = self
            .inner()
            .watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *watch = Some(handle);
        Ok(())
    }
}

/// Runs the debounce state machine on the runtime's background pool.
///
/// Every notification restarts the quiet-period timer, so a burst of
/// events continuously closer together than [`RELOAD_DEBOUNCE`] produces
/// exactly one reload. The loop exits when the event channel closes or
/// the owning store has been dropped.
pub(crate) fn spawn_debounce_loop(
    runtime: &tokio::runtime::Handle,
    store: Weak<StoreInner>,
    mut event_rx: mpsc::UnboundedReceiver<FileEvent>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        let mut pending = false;
        let debounce = tokio::time::sleep(RELOAD_DEBOUNCE);
        tokio::pin!(debounce);

        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(event) => {
                            trace!(
                                path = %event.path.display(),
                                kind = ?event.kind,
                                "file change notification"
                            );
                            pending = true;
                            debounce
                                .as_mut()
                                .reset(tokio::time::Instant::now() + RELOAD_DEBOUNCE);
                        }
                        None => break,
                    }
                }

                _ = &mut debounce, if pending => {
                    pending = false;
                    let Some(store) = store.upgrade().map(XmlConfigStore::from_inner) else {
                        break;
                    };

                    let path = store.inner().path.clone();
                    match store.load() {
                        Ok(()) => {
                            debug!(
                                path = %path.display(),
                                "configuration reloaded after external change"
                            );
                            let _ = store.inner().reload_tx.send(ReloadEvent::new(path));
                        }
                        Err(error) => {
                            warn!(
                                %error,
                                path = %path.display(),
                                "background configuration reload failed"
                            );
                        }
                    }
                }
            }
        }
    })
}
