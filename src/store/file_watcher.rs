use std::{
    error,
    path::{Path, PathBuf},
};

use notify::{Event, EventKind, RecommendedWatcher, Watcher, recommended_watcher};
use tokio::sync::mpsc;

/// A change notification for the watched configuration file.
#[derive(Debug, Clone)]
pub(crate) struct FileEvent {
    /// The path of the file that changed.
    pub path: PathBuf,
    /// The type of change that occurred.
    pub kind: FileEventKind,
}

/// The type of file system change that occurred.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FileEventKind {
    /// File was modified
    Modified,
    /// File was created
    Created,
    /// File was removed
    Removed,
}

/// Watches one configuration file and forwards its change notifications
/// into a channel the reload loop can consume.
///
/// The parent directory is watched rather than the file itself, so editors
/// that save through a write-then-rename keep producing notifications for
/// the path after the original inode is gone.
pub(crate) struct FileWatcher {
    watcher: RecommendedWatcher,
    target: PathBuf,
}

impl FileWatcher {
    /// Creates a watcher for `target` and returns it together with the
    /// receiving end of its event channel.
    ///
    /// Uses an unbounded channel since file events are infrequent but bursty.
    ///
    /// # Errors
    /// Returns error if the underlying file system watcher cannot be initialized.
    pub fn new(
        target: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FileEvent>), Box<dyn error::Error>> {
        let target = std::path::absolute(target)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let filter = target.clone();
        let watcher = recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };

            let kind = match event.kind {
                EventKind::Create(_) => FileEventKind::Created,
                EventKind::Modify(_) => FileEventKind::Modified,
                EventKind::Remove(_) => FileEventKind::Removed,
                _ => return,
            };

            for path in event.paths {
                if path == filter {
                    let _ = event_tx.send(FileEvent {
                        path,
                        kind: kind.clone(),
                    });
                }
            }
        })?;

        Ok((Self { watcher, target }, event_rx))
    }

    /// Starts monitoring the directory containing the target file.
    ///
    /// # Errors
    /// Returns error if the watcher fails to monitor the directory.
    pub fn watch(&mut self) -> Result<(), notify::Error> {
        let dir = match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.watcher.watch(&dir, notify::RecursiveMode::NonRecursive)
    }
}
