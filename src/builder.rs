use std::path::PathBuf;

use crate::config::Config;
use crate::engine::run;
use crate::error::MirrorError;
use crate::local::LocalFs;
use crate::log::TracingLog;
use crate::path::normalize;
use crate::results::SyncReport;
use crate::traits::{Filesystem, OperationLog};

// ---------------------------------------------------------------------------
// MirrorBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and executing a mirror run.
///
/// Created via [`treemirror::mirror()`](crate::mirror). Configure with chained
/// builder methods, then call [`build()`](MirrorBuilder::build) for a
/// [`Config`] or [`run()`](MirrorBuilder::run) to execute directly.
///
/// # Example
///
/// ```rust,ignore
/// let report = treemirror::mirror()
///     .source("/data/projects")
///     .replica("/mnt/backup/projects")
///     .sync_permissions(true)
///     .run()?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct MirrorBuilder {
    source:           Option<PathBuf>,
    replica:          Option<PathBuf>,
    sync_permissions: bool,
    log_file:         Option<PathBuf>,
    debug:            bool,
}

impl MirrorBuilder {
    // ── Roots ─────────────────────────────────────────────────────────────

    /// The tree to mirror from. Must exist when the run starts.
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// The tree to mirror into. Created, parents included, if missing.
    pub fn replica(mut self, path: impl Into<PathBuf>) -> Self {
        self.replica = Some(path.into());
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Push ownership and permission bits from source to replica.
    ///
    /// Disabled by default. If the process lacks the privilege to change
    /// ownership, the run logs a warning and carries on without it.
    pub fn sync_permissions(mut self, yes: bool) -> Self {
        self.sync_permissions = yes;
        self
    }

    /// File that receives persisted log events. Only the binary reads this.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Persist verbose events to the log file as well.
    pub fn debug(mut self, yes: bool) -> Self {
        self.debug = yes;
        self
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Validate inputs and freeze them into a [`Config`].
    ///
    /// Roots are made absolute and normalized here, once.
    ///
    /// # Errors
    ///
    /// Returns `Err` when a root is missing, cannot be made absolute, or
    /// when one root lies inside the other.
    pub fn build(self) -> Result<Config, MirrorError> {
        let source = self.source.ok_or(MirrorError::MissingRoot("source"))?;
        let replica = self.replica.ok_or(MirrorError::MissingRoot("replica"))?;

        let source_root = normalize(&source).map_err(|e| MirrorError::io(&source, e))?;
        let replica_root = normalize(&replica).map_err(|e| MirrorError::io(&replica, e))?;

        if source_root.starts_with(&replica_root) || replica_root.starts_with(&source_root) {
            return Err(MirrorError::OverlappingRoots { source_root, replica_root });
        }

        Ok(Config {
            source_root,
            replica_root,
            sync_permissions: self.sync_permissions,
            log_file:         self.log_file,
            debug:            self.debug,
        })
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Build the config and run against the given filesystem and log.
    pub fn run_with(self, fs: &dyn Filesystem, log: &dyn OperationLog) -> Result<SyncReport, MirrorError> {
        let config = self.build()?;
        run(&config, fs, log)
    }

    /// Build the config and run against the local filesystem, logging
    /// through `tracing`.
    ///
    /// Blocks until the run completes.
    pub fn run(self) -> Result<SyncReport, MirrorError> {
        self.run_with(&LocalFs, &TracingLog)
    }
}
