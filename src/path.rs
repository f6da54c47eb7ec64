//! Translation between the source tree and the replica tree.
//!
//! Paths are mapped by stripping the root prefix component-by-component and
//! re-joining the remainder onto the other root. The root is never treated as
//! a substring, so a root name that recurs deeper in a path stays intact.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::entry::TreeSide;
use crate::error::MirrorError;

// ---------------------------------------------------------------------------
// RelativePath
// ---------------------------------------------------------------------------

/// A path with its tree root stripped.
///
/// This is the join key between the two trees: a source entry and a replica
/// entry with equal relative paths are the same logical item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().components().collect())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Number of path segments. The tree root itself has depth `0`.
    pub fn depth(&self) -> usize {
        self.0.components().count()
    }

    /// True for the tree root.
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }

    /// Whether `ancestor` is this path or one of its parents.
    pub fn starts_with(&self, ancestor: &RelativePath) -> bool {
        self.0.starts_with(&ancestor.0)
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

// ---------------------------------------------------------------------------
// PathMapper
// ---------------------------------------------------------------------------

/// Maps absolute paths between the source root and the replica root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    source_root:  PathBuf,
    replica_root: PathBuf,
}

impl PathMapper {
    pub fn new(config: &Config) -> Self {
        Self {
            source_root:  config.source_root.clone(),
            replica_root: config.replica_root.clone(),
        }
    }

    pub fn root(&self, side: TreeSide) -> &Path {
        match side {
            TreeSide::Source  => &self.source_root,
            TreeSide::Replica => &self.replica_root,
        }
    }

    /// Strip the `side` root from `path`.
    ///
    /// Fails with [`MirrorError::InvalidPath`] when `path` is not under that root.
    pub fn relative(&self, path: &Path, side: TreeSide) -> Result<RelativePath, MirrorError> {
        let root = self.root(side);
        path.strip_prefix(root)
            .map(RelativePath::new)
            .map_err(|_| MirrorError::InvalidPath {
                path: path.to_path_buf(),
                root: root.to_path_buf(),
            })
    }

    /// Absolute path of `rel` under the `side` root.
    pub fn resolve(&self, rel: &RelativePath, side: TreeSide) -> PathBuf {
        if rel.is_root() {
            self.root(side).to_path_buf()
        } else {
            self.root(side).join(rel.as_path())
        }
    }

    /// The replica path corresponding to an absolute source path.
    pub fn to_replica(&self, source_path: &Path) -> Result<PathBuf, MirrorError> {
        let rel = self.relative(source_path, TreeSide::Source)?;
        Ok(self.resolve(&rel, TreeSide::Replica))
    }

    /// The source path corresponding to an absolute replica path.
    pub fn to_source(&self, replica_path: &Path) -> Result<PathBuf, MirrorError> {
        let rel = self.relative(replica_path, TreeSide::Replica)?;
        Ok(self.resolve(&rel, TreeSide::Source))
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Make `path` absolute and collapse it lexically.
///
/// Separators are unified, `.` segments dropped, `..` segments applied and
/// trailing separators removed. Symlinks are not resolved; the replica root
/// may not exist yet.
pub(crate) fn normalize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir    => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
