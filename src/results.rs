use std::time::Duration;

use crate::error::MirrorError;

/// The outcome of a completed run.
///
/// A run always visits every enumerated item once per pass, so a report with
/// failures is still a finished run. The counters and `errors` are the only
/// record of what went wrong; nothing here is fatal.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Replica directories that did not exist and were created.
    pub dirs_created: usize,

    /// Files copied because the replica had no counterpart.
    pub files_created: usize,

    /// Files copied over a replica counterpart of a different length.
    pub files_updated: usize,

    /// Files left alone because lengths matched.
    pub files_unchanged: usize,

    /// Replica paths whose permission descriptor was rewritten.
    pub permissions_applied: usize,

    /// Replica entries removed because the source no longer has them.
    pub orphans_removed: usize,

    /// Per-item operations that failed (create, copy, permissions, delete).
    pub failures: usize,

    /// Entries skipped during enumeration or because of their kind.
    pub skipped: usize,

    /// Recoverable errors, in the order they happened.
    pub errors: Vec<MirrorError>,

    pub stats: SyncStats,
}

impl SyncReport {
    /// Number of changes made to the replica tree's structure or content.
    pub fn changes(&self) -> usize {
        self.dirs_created + self.files_created + self.files_updated + self.orphans_removed
    }

    /// True when nothing failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.failures == 0 && self.skipped == 0
    }
}

/// Size and timing of a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncStats {
    /// Entries found in the source tree on the sync pass.
    pub source_entries: usize,

    /// Entries found in the replica tree on the reclaim pass.
    pub replica_entries: usize,

    /// Wall-clock time from start to finish.
    pub duration: Duration,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} dirs created, {} files created, {} updated, {} unchanged, \
             {} permissions applied, {} removed, {} failed, {} skipped in {:.3}s",
            self.dirs_created,
            self.files_created,
            self.files_updated,
            self.files_unchanged,
            self.permissions_applied,
            self.orphans_removed,
            self.failures,
            self.skipped,
            self.stats.duration.as_secs_f64(),
        )
    }
}
