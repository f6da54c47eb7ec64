use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use crate::entry::{Entry, EntryKind, TreeSide};
use crate::error::MirrorError;
use crate::log::LogLevel;
use crate::traits::{Filesystem, OperationLog};

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Every entry found under one root, fully materialized.
///
/// Both the sync pass and the reclaim pass need the complete tree before
/// they can compare anything, so the walk is drained up front.
#[derive(Debug)]
pub struct Tree {
    pub side:    TreeSide,
    pub entries: Vec<Entry>,

    /// Subtrees that could not be read and were skipped.
    pub errors:  Vec<MirrorError>,
}

impl Tree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_dir())
    }

    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_file())
    }
}

/// Walk `root` to completion.
///
/// An unreadable subtree is skipped with a `Warning` and kept in
/// [`Tree::errors`]; it never aborts the walk.
pub fn enumerate(fs: &dyn Filesystem, log: &dyn OperationLog, root: &Path, side: TreeSide) -> Tree {
    let tree = collect(fs, root, side);
    for e in &tree.errors {
        log.emit(LogLevel::Warning, &format!("Skipping unreadable {side} entry: {e}"));
    }
    tree
}

/// Like [`enumerate`], without logging the skipped subtrees.
pub fn collect(fs: &dyn Filesystem, root: &Path, side: TreeSide) -> Tree {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for item in fs.walk(root, side) {
        match item {
            Ok(entry) => entries.push(entry),
            Err(e) => errors.push(e),
        }
    }

    Tree { side, entries, errors }
}

// ---------------------------------------------------------------------------
// Local walk
// ---------------------------------------------------------------------------

/// Sequential walk of a local directory with every filter switched off.
///
/// Hidden entries are included, ignore files are not honoured, symlinks are
/// reported but never followed, and siblings come out sorted by name so two
/// walks of the same tree yield the same order.
pub(crate) fn walk_local(root: &Path, side: TreeSide) -> impl Iterator<Item = Result<Entry, MirrorError>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .ignore(false)
        .parents(false)
        .hidden(false)
        .follow_links(false)
        .same_file_system(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    builder.build().filter_map(move |res| match res {
        // Skip the root itself
        Ok(entry) if entry.depth() == 0 => None,
        Ok(entry) => Some(to_entry(entry, side)),
        Err(e) => Some(Err(map_ignore_error(e))),
    })
}

fn to_entry(entry: DirEntry, side: TreeSide) -> Result<Entry, MirrorError> {
    let kind = match entry.file_type() {
        Some(ft) if ft.is_dir()     => EntryKind::Dir,
        Some(ft) if ft.is_file()    => EntryKind::File,
        Some(ft) if ft.is_symlink() => EntryKind::Symlink,
        _                           => EntryKind::Other,
    };

    let len = if kind == EntryKind::File {
        entry.metadata().map_err(map_ignore_error)?.len()
    } else {
        0
    };

    Ok(Entry {
        path: entry.into_path(),
        kind,
        len,
        side,
    })
}

// ---------------------------------------------------------------------------
// Map ignore::Error to MirrorError
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error) -> MirrorError {
    match e {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(io_err) => {
                if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                    MirrorError::PermissionDenied(path)
                } else {
                    MirrorError::io(path, io_err)
                }
            }
            other => MirrorError::Walk(format!("{}: {other}", path.display())),
        },
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err),
        ignore::Error::Loop { child, .. }    => MirrorError::SymlinkLoop(child),
        ignore::Error::Io(io_err)            => MirrorError::io(PathBuf::new(), io_err),
        other                                => MirrorError::Walk(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn local_walk_includes_hidden_and_skips_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), "x").unwrap();
        fs::write(dir.path().join(".gitignore"), "visible.txt\n").unwrap();
        fs::write(dir.path().join("visible.txt"), "abc").unwrap();

        let entries: Vec<Entry> = walk_local(dir.path(), TreeSide::Source)
            .collect::<Result<_, _>>()
            .unwrap();

        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [".gitignore", ".hidden", "visible.txt"]);
        assert_eq!(entries[2].len, 3);
        assert!(entries.iter().all(|e| e.side == TreeSide::Source));
    }

    #[test]
    fn local_walk_is_depth_first_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("b/inner/z.txt"), "").unwrap();
        fs::write(dir.path().join("c.txt"), "").unwrap();

        let rels: Vec<PathBuf> = walk_local(dir.path(), TreeSide::Replica)
            .map(|e| e.unwrap().path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rels,
            ["a.txt", "b", "b/inner", "b/inner/z.txt", "c.txt"].map(PathBuf::from)
        );
    }
}
