use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    // Setup
    #[error("source root does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("replica root could not be created: {}", path.display())]
    ReplicaUncreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no {0} root configured")]
    MissingRoot(&'static str),

    #[error("source {} and replica {} overlap", source_root.display(), replica_root.display())]
    OverlappingRoots { source_root: PathBuf, replica_root: PathBuf },

    // Path mapping
    #[error("{} is not under {}", path.display(), root.display())]
    InvalidPath { path: PathBuf, root: PathBuf },

    // Traversal
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("symlink loop at {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("walk error: {0}")]
    Walk(String),

    // Per-item I/O
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::SourceMissing(p)
            | Self::PermissionDenied(p)
            | Self::SymlinkLoop(p)
            | Self::ReplicaUncreatable { path: p, .. }
            | Self::InvalidPath { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the run can continue after this error.
    ///
    /// Everything that happens to a single item is recoverable: it is logged,
    /// counted in the report, and the run moves on to the next item.
    ///
    /// Setup errors (missing source root, uncreatable replica root, builder
    /// misuse, overlapping roots) halt the run before any item is touched.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::SourceMissing(_)
                | Self::ReplicaUncreatable { .. }
                | Self::MissingRoot(_)
                | Self::OverlappingRoots { .. }
        )
    }
}
