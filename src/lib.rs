//! # treemirror
//!
//! One-way directory mirroring: source tree in, identical replica out.
//!
//! A run makes the replica structurally identical to the source: missing
//! directories are created, new or resized files are copied, ownership and
//! permissions are optionally pushed across, and anything in the replica that
//! the source no longer has is removed. Running it again with no source
//! changes does nothing.
//!
//! treemirror owns the algorithm: enumeration, path mapping, change
//! detection, the create/update/delete decisions and permission
//! reconciliation. The actual I/O goes through the [`Filesystem`] trait and
//! every decision is reported through [`OperationLog`], so both can be
//! swapped out.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let report = treemirror::mirror()
//!     .source("/data/projects")
//!     .replica("/mnt/backup/projects")
//!     .run()
//!     .unwrap();
//!
//! println!("{report}");
//! ```
//!
//! # Change detection
//!
//! Files are compared by **length only**. A file whose content changed but
//! whose size did not is left alone. This is deliberate: it avoids reading
//! either file. Do not rely on a bit-exact replica after content-only edits.
//!
//! # Custom filesystems and logs
//!
//! ```rust
//! use treemirror::{LocalFs, LogLevel, OperationLog};
//!
//! struct Stderr;
//!
//! impl OperationLog for Stderr {
//!     fn emit(&self, level: LogLevel, message: &str) {
//!         if level.is_persisted() {
//!             eprintln!("[{level:?}] {message}");
//!         }
//!     }
//! }
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
//!
//! let report = treemirror::mirror()
//!     .source(dir.path())
//!     .replica(dir.path().with_extension("replica"))
//!     .run_with(&LocalFs, &Stderr)
//!     .unwrap();
//!
//! assert_eq!(report.files_created, 1);
//! # std::fs::remove_dir_all(dir.path().with_extension("replica")).unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod detect;
pub mod engine;
pub mod path;
pub mod permissions;
pub mod reclaim;
pub mod walk;

mod builder;
mod config;
mod entry;
mod error;
mod local;
mod log;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::MirrorBuilder;
pub use config::Config;
pub use detect::SyncDecision;
pub use entry::{Entry, EntryKind, TreeSide};
pub use error::MirrorError;
pub use local::LocalFs;
pub use log::{LogLevel, TracingLog, OPS_TARGET};
pub use path::{PathMapper, RelativePath};
pub use permissions::{AccessEntry, PermissionClass, PermissionDescriptor};
pub use results::{SyncReport, SyncStats};
pub use traits::{Filesystem, OperationLog};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Create a new [`MirrorBuilder`] to configure and run a mirror.
///
/// # Example
///
/// ```rust
/// let config = treemirror::mirror()
///     .source("/data/projects")
///     .replica("/mnt/backup/projects")
///     .sync_permissions(true)
///     .build()
///     .unwrap();
///
/// assert!(config.sync_permissions);
/// assert!(config.source_root.is_absolute());
/// ```
pub fn mirror() -> MirrorBuilder {
    MirrorBuilder::default()
}
