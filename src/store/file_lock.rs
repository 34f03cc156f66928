use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

// One mutex per backing file, shared by every store in the process that
// points at the same path. Entries are never evicted; configuration paths
// are few.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Returns the process-wide mutex guarding file access for `path`.
///
/// Load and Save hold this lock for the duration of their file I/O so that
/// concurrent store instances never interleave reads and writes on the
/// same document.
pub(crate) fn for_path(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}
