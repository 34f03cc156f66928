//! Unit tests for the store module.
//! Filesystem access only where the debounce loop needs a backing file.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

mod saver;
mod store;

use crate::store::snapshot::Snapshot;

/// Collapses a snapshot into comparable (key, value, raw) triples.
pub(super) fn triples(snapshot: &Snapshot) -> Vec<(String, Option<String>, bool)> {
    snapshot
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.clone(), entry.raw_block))
        .collect()
}
