use std::io;
use std::path::Path;

use crate::entry::{Entry, EntryKind, TreeSide};
use crate::error::MirrorError;
use crate::log::LogLevel;
use crate::permissions::PermissionDescriptor;

/// The filesystem primitives the engine is built on.
///
/// Implement this to mirror anything that looks like a tree of directories
/// and files. [`LocalFs`](crate::LocalFs) is the host implementation; tests
/// wrap it to inject failures or count calls.
///
/// # Object Safety
///
/// `Filesystem` is object-safe. The engine takes `&dyn Filesystem`, so
/// `walk()` returns a boxed iterator rather than `impl Iterator`.
///
/// # Error Handling
///
/// Every primitive acts on one path and reports failure through its return
/// value. The engine decides whether a failure is fatal; implementations
/// should never panic or retry on their own.
pub trait Filesystem: Send + Sync {
    /// List every entry under `root`, recursively, hidden entries included.
    ///
    /// The root itself is not yielded. Unreadable subtrees are yielded as
    /// `Err` and skipped; the walk carries on with their siblings. Order
    /// must be deterministic for a given tree.
    fn walk(&self, root: &Path, side: TreeSide) -> Box<dyn Iterator<Item = Result<Entry, MirrorError>>>;

    /// Whether anything exists at `path`. Symlinks are not followed.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory, following symlinks. Used for the roots.
    fn is_dir(&self, path: &Path) -> bool;

    /// What is at `path`, without following a final symlink. `None` if nothing.
    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>>;

    /// Byte length of the file at `path`, or `None` if nothing is there.
    ///
    /// Anything other than a regular file at `path` is an error.
    fn file_len(&self, path: &Path) -> io::Result<Option<u64>>;

    /// Create one directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Copy `from` to `to`, replacing `to` if it exists.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Delete `path`. Directories are removed with everything under them.
    fn remove(&self, path: &Path) -> io::Result<()>;

    fn read_permissions(&self, path: &Path) -> io::Result<PermissionDescriptor>;

    fn write_permissions(&self, path: &Path, descriptor: &PermissionDescriptor) -> io::Result<()>;

    /// Whether this process may rewrite ownership and permissions at all.
    fn can_write_permissions(&self) -> bool;
}

/// Receives every decision and outcome of a run.
///
/// [`TracingLog`](crate::TracingLog) forwards to `tracing`; the binary decides
/// which levels reach the log file and which only reach the terminal.
///
/// # Example
///
/// ```rust
/// use std::sync::Mutex;
/// use treemirror::{LogLevel, OperationLog};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<(LogLevel, String)>>);
///
/// impl OperationLog for Recorder {
///     fn emit(&self, level: LogLevel, message: &str) {
///         self.0.lock().unwrap().push((level, message.to_owned()));
///     }
/// }
/// ```
pub trait OperationLog: Send + Sync {
    fn emit(&self, level: LogLevel, message: &str);
}
