//! Log directory retention.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Delete regular files under `dir` last modified before the cutoff.
///
/// Returns how many were removed. A missing directory is simply zero; the
/// process may never have written a log file yet.
pub fn prune_before(dir: &Path, cutoff: DateTime<Utc>) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    let cutoff: SystemTime = cutoff.into();

    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified < cutoff {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => debug!(path = %entry.path().display(), error = %e, "log prune skip"),
            }
        }
    }
    removed
}
