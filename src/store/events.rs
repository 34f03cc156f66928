use std::{path::PathBuf, time::Instant};

/// Notification emitted after the store reloaded itself from its backing
/// file following an external change.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadEvent {
    /// Path of the backing file that changed.
    pub path: PathBuf,
    /// Timestamp of the completed reload.
    pub timestamp: Instant,
}

impl ReloadEvent {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            timestamp: Instant::now(),
        }
    }
}
