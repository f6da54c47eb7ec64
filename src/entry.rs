use std::path::PathBuf;

/// A single filesystem object discovered while walking one of the two trees.
///
/// Entries are snapshots: they are taken once at enumeration time and never
/// updated. Walking the tree again produces fresh entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute path to the entry.
    pub path: PathBuf,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// Byte length. Only meaningful for files; `0` for everything else.
    pub len: u64,

    /// Which tree the entry was found under.
    pub side: TreeSide,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// The kind of a traversed entry.
///
/// Only `File` and `Dir` are mirrored. Symlinks and special files are
/// reported by the walk so the reclaimer can see them in the replica, but
/// the planner skips them in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link (never followed).
    Symlink,

    /// Anything else (device files, pipes, sockets, etc.).
    Other,
}

/// The tree an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSide {
    Source,
    Replica,
}

impl std::fmt::Display for TreeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source  => f.write_str("source"),
            Self::Replica => f.write_str("replica"),
        }
    }
}
