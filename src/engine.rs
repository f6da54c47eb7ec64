use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::detect::{decide, SyncDecision};
use crate::entry::{Entry, EntryKind, TreeSide};
use crate::error::MirrorError;
use crate::log::LogLevel;
use crate::path::PathMapper;
use crate::permissions::{reconcile, Reconciled};
use crate::reclaim::reclaim;
use crate::results::{SyncReport, SyncStats};
use crate::traits::{Filesystem, OperationLog};
use crate::walk::{collect, enumerate, Tree};

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Mirror `config.source_root` onto `config.replica_root`.
///
/// Strictly sequential: the source tree is walked in full, directories are
/// created, then files are copied, then both trees are walked again and
/// replica-only entries are removed.
///
/// # Errors
///
/// Only setup fails the run: a source root that is not a directory, or a
/// replica root that is not a directory and cannot be created. Every
/// per-item failure is logged, counted in the returned [`SyncReport`], and
/// skipped.
pub fn run(config: &Config, fs: &dyn Filesystem, log: &dyn OperationLog) -> Result<SyncReport, MirrorError> {
    let start = Instant::now();

    prepare_roots(config, fs, log)?;
    let sync_permissions = permissions_enabled(config, fs, log);

    let mapper = PathMapper::new(config);
    let mut report = SyncReport::default();

    let source = enumerate(fs, log, &config.source_root, TreeSide::Source);
    let planner = Planner { fs, log, mapper: &mapper, sync_permissions };
    let blocked = planner.sync_dirs(&source, &mut report);
    planner.sync_files(&source, &blocked, &mut report);
    planner.skip_unsupported(&source, &mut report);

    let source_entries = source.entries.len();
    absorb_walk_errors(&mut report, source);

    // Reclaim works on fresh snapshots of both trees. Source walk errors were
    // already logged and counted on the first pass; here they only shield
    // subtrees.
    let source = collect(fs, &config.source_root, TreeSide::Source);
    let replica = enumerate(fs, log, &config.replica_root, TreeSide::Replica);
    let replica_entries = replica.entries.len();

    let reclaimed = reclaim(fs, log, &mapper, &source, &replica);
    report.orphans_removed += reclaimed.removed;
    report.failures += reclaimed.failed;
    report.errors.extend(reclaimed.errors);
    absorb_walk_errors(&mut report, replica);

    report.stats = SyncStats {
        source_entries,
        replica_entries,
        duration: start.elapsed(),
    };
    Ok(report)
}

fn absorb_walk_errors(report: &mut SyncReport, tree: Tree) {
    report.skipped += tree.errors.len();
    report.errors.extend(tree.errors);
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Check the source root and make sure the replica root exists.
fn prepare_roots(config: &Config, fs: &dyn Filesystem, log: &dyn OperationLog) -> Result<(), MirrorError> {
    if !fs.is_dir(&config.source_root) {
        let err = MirrorError::SourceMissing(config.source_root.clone());
        log.emit(LogLevel::Error, &err.to_string());
        return Err(err);
    }

    if fs.is_dir(&config.replica_root) {
        return Ok(());
    }
    if fs.exists(&config.replica_root) {
        let err = MirrorError::ReplicaUncreatable {
            path:   config.replica_root.clone(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
        };
        log.emit(LogLevel::Error, &err.to_string());
        return Err(err);
    }

    // Create missing ancestors top-down, then the root itself
    let mut missing: Vec<PathBuf> = config
        .replica_root
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !fs.exists(p))
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();

    for dir in missing {
        if let Err(source) = fs.create_dir(&dir) {
            let err = MirrorError::ReplicaUncreatable {
                path: config.replica_root.clone(),
                source,
            };
            log.emit(LogLevel::Error, &format!("{err}: {}", dir.display()));
            return Err(err);
        }
    }

    log.emit(LogLevel::Info, &format!("Created replica root {}", config.replica_root.display()));
    Ok(())
}

/// Permission sync without the privilege to carry it out degrades to off.
fn permissions_enabled(config: &Config, fs: &dyn Filesystem, log: &dyn OperationLog) -> bool {
    if !config.sync_permissions {
        return false;
    }
    if !fs.can_write_permissions() {
        log.emit(
            LogLevel::Warning,
            "Permission sync requested but this process lacks the privilege to change ownership; disabled",
        );
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Drives the source-rooted passes: directories first, then files.
struct Planner<'a> {
    fs:               &'a dyn Filesystem,
    log:              &'a dyn OperationLog,
    mapper:           &'a PathMapper,
    sync_permissions: bool,
}

impl Planner<'_> {
    /// Make every source directory exist as a real directory in the replica.
    ///
    /// Returns the replica directories that could not be made, so the file
    /// pass never writes beneath them.
    fn sync_dirs(&self, source: &Tree, report: &mut SyncReport) -> Vec<PathBuf> {
        let mut blocked: Vec<PathBuf> = Vec::new();

        for dir in source.dirs() {
            let Some(replica) = self.replica_path(dir, report) else {
                continue;
            };
            if self.is_blocked(&replica, &blocked, report) {
                continue;
            }

            let ready = match self.fs.entry_kind(&replica) {
                Ok(Some(EntryKind::Dir)) => {
                    self.log.emit(
                        LogLevel::Verbose,
                        &format!("Directory {} already exists", replica.display()),
                    );
                    true
                }
                Ok(None) => self.create_dir(&replica, report),
                Ok(Some(EntryKind::Symlink | EntryKind::Other)) => {
                    self.replace(&replica, report) && self.create_dir(&replica, report)
                }
                Ok(Some(EntryKind::File)) => {
                    self.kind_mismatch(&replica, "a file is in the way of a directory", report);
                    false
                }
                Err(e) => {
                    self.log.emit(LogLevel::Error, &format!("Failed to inspect {}: {e}", replica.display()));
                    report.failures += 1;
                    report.errors.push(MirrorError::io(replica.clone(), e));
                    false
                }
            };

            if ready {
                self.reconcile(&dir.path, &replica, report);
            } else {
                blocked.push(replica);
            }
        }

        blocked
    }

    fn sync_files(&self, source: &Tree, blocked: &[PathBuf], report: &mut SyncReport) {
        for file in source.files() {
            let Some(replica) = self.replica_path(file, report) else {
                continue;
            };
            if self.is_blocked(&replica, blocked, report) {
                continue;
            }

            match self.fs.entry_kind(&replica) {
                Ok(None | Some(EntryKind::File)) => {}
                Ok(Some(EntryKind::Symlink | EntryKind::Other)) => {
                    if !self.replace(&replica, report) {
                        continue;
                    }
                }
                Ok(Some(EntryKind::Dir)) => {
                    self.kind_mismatch(&replica, "a directory is in the way of a file", report);
                    continue;
                }
                Err(e) => {
                    self.log.emit(LogLevel::Error, &format!("Failed to inspect {}: {e}", replica.display()));
                    report.failures += 1;
                    report.errors.push(MirrorError::io(replica, e));
                    continue;
                }
            }

            let replica_len = match self.fs.file_len(&replica) {
                Ok(len) => len,
                Err(e) => {
                    self.log.emit(LogLevel::Error, &format!("Failed to inspect {}: {e}", replica.display()));
                    report.failures += 1;
                    report.errors.push(MirrorError::io(replica, e));
                    continue;
                }
            };

            let decision = decide(file, replica_len);
            if decision == SyncDecision::Unchanged {
                self.log.emit(
                    LogLevel::Verbose,
                    &format!("{} already exists and is same size", replica.display()),
                );
                report.files_unchanged += 1;
            } else {
                if let Err(e) = self.fs.copy_file(&file.path, &replica) {
                    self.log.emit(
                        LogLevel::Error,
                        &format!("Failed to copy {} to {}: {e}", file.path.display(), replica.display()),
                    );
                    report.failures += 1;
                    report.errors.push(MirrorError::io(replica, e));
                    continue;
                }

                if decision == SyncDecision::Create {
                    self.log.emit(LogLevel::Info, &format!("New file {}", replica.display()));
                    report.files_created += 1;
                } else {
                    self.log.emit(
                        LogLevel::Info,
                        &format!(
                            "Updated {} ({} -> {} bytes)",
                            replica.display(),
                            replica_len.unwrap_or_default(),
                            file.len
                        ),
                    );
                    report.files_updated += 1;
                }
            }

            self.reconcile(&file.path, &replica, report);
        }
    }

    /// Symlinks and special files are not mirrored.
    fn skip_unsupported(&self, source: &Tree, report: &mut SyncReport) {
        for entry in &source.entries {
            if matches!(entry.kind, EntryKind::Symlink | EntryKind::Other) {
                self.log.emit(
                    LogLevel::Warning,
                    &format!("Skipping {}: not a regular file or directory", entry.path.display()),
                );
                report.skipped += 1;
            }
        }
    }

    fn replica_path(&self, entry: &Entry, report: &mut SyncReport) -> Option<PathBuf> {
        match self.mapper.to_replica(&entry.path) {
            Ok(p) => Some(p),
            Err(e) => {
                self.log.emit(LogLevel::Error, &e.to_string());
                report.failures += 1;
                report.errors.push(e);
                None
            }
        }
    }

    fn create_dir(&self, replica: &Path, report: &mut SyncReport) -> bool {
        match self.fs.create_dir(replica) {
            Ok(()) => {
                self.log.emit(LogLevel::Info, &format!("Created directory {}", replica.display()));
                report.dirs_created += 1;
                true
            }
            Err(e) => {
                self.log.emit(
                    LogLevel::Error,
                    &format!("Failed to create directory {}: {e}", replica.display()),
                );
                report.failures += 1;
                report.errors.push(MirrorError::io(replica.to_path_buf(), e));
                false
            }
        }
    }

    /// Remove a replica symlink or special file that sits where the source
    /// has a real file or directory. The link itself goes, never its target.
    fn replace(&self, replica: &Path, report: &mut SyncReport) -> bool {
        match self.fs.remove(replica) {
            Ok(()) => {
                self.log.emit(
                    LogLevel::Info,
                    &format!("Removed {} (not a regular file or directory)", replica.display()),
                );
                true
            }
            Err(e) => {
                self.log.emit(LogLevel::Error, &format!("Failed to remove {}: {e}", replica.display()));
                report.failures += 1;
                report.errors.push(MirrorError::io(replica.to_path_buf(), e));
                false
            }
        }
    }

    fn kind_mismatch(&self, replica: &Path, what: &str, report: &mut SyncReport) {
        self.log.emit(LogLevel::Error, &format!("Cannot mirror {}: {what}", replica.display()));
        report.failures += 1;
        report.errors.push(MirrorError::io(
            replica.to_path_buf(),
            io::Error::new(io::ErrorKind::AlreadyExists, what.to_owned()),
        ));
    }

    /// Entries beneath a replica directory that could not be made are skipped.
    fn is_blocked(&self, replica: &Path, blocked: &[PathBuf], report: &mut SyncReport) -> bool {
        let Some(parent) = blocked.iter().find(|b| replica.starts_with(b)) else {
            return false;
        };
        self.log.emit(
            LogLevel::Warning,
            &format!("Skipping {}: {} is not a directory", replica.display(), parent.display()),
        );
        report.skipped += 1;
        true
    }

    fn reconcile(&self, source: &Path, replica: &Path, report: &mut SyncReport) {
        if !self.sync_permissions {
            return;
        }
        match reconcile(self.fs, self.log, source, replica) {
            Reconciled::Applied => report.permissions_applied += 1,
            Reconciled::Failed(e) => {
                report.failures += 1;
                report.errors.push(e);
            }
            Reconciled::InSync => {}
        }
    }
}
