use std::collections::HashSet;

use crate::entry::TreeSide;
use crate::error::MirrorError;
use crate::log::LogLevel;
use crate::path::{PathMapper, RelativePath};
use crate::traits::{Filesystem, OperationLog};
use crate::walk::Tree;

/// What the reclaim pass did.
#[derive(Debug, Default)]
pub struct Reclaimed {
    pub removed: usize,
    pub failed:  usize,
    pub errors:  Vec<MirrorError>,
}

/// Relative paths present in `replica` but not in `source`, deepest first.
///
/// Siblings at the same depth keep a stable, sorted order. Anything under a
/// source subtree that could not be read is never an orphan: its absence
/// from the source walk says nothing about the source.
pub fn orphans(mapper: &PathMapper, source: &Tree, replica: &Tree) -> Vec<RelativePath> {
    let keep: HashSet<RelativePath> = source
        .entries
        .iter()
        .filter_map(|e| mapper.relative(&e.path, TreeSide::Source).ok())
        .collect();

    let unreadable = unreadable(mapper, source);

    let mut stale: Vec<RelativePath> = replica
        .entries
        .iter()
        .filter_map(|e| mapper.relative(&e.path, TreeSide::Replica).ok())
        .filter(|rel| !rel.is_root() && !keep.contains(rel))
        .filter(|rel| !unreadable.iter().any(|u| rel.starts_with(u)))
        .collect();

    stale.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.cmp(b)));
    stale
}

/// Source subtrees that could not be read, relative to the source root.
///
/// An error that carries no path, or a path outside the source root, stands
/// for the root itself and so shields the whole replica.
fn unreadable(mapper: &PathMapper, source: &Tree) -> Vec<RelativePath> {
    source
        .errors
        .iter()
        .map(|e| {
            e.path()
                .and_then(|p| mapper.relative(p, TreeSide::Source).ok())
                .unwrap_or_else(|| RelativePath::new(""))
        })
        .collect()
}

/// Delete every replica entry that has no counterpart in the source.
///
/// Entries go deepest first, so a stale directory is always emptied before
/// it is removed itself. A failed delete is logged and the pass moves on.
pub fn reclaim(
    fs: &dyn Filesystem,
    log: &dyn OperationLog,
    mapper: &PathMapper,
    source: &Tree,
    replica: &Tree,
) -> Reclaimed {
    let mut out = Reclaimed::default();

    if replica.is_empty() {
        log.emit(LogLevel::Verbose, "Replica is empty, nothing to remove");
        return out;
    }

    if unreadable(mapper, source).iter().any(RelativePath::is_root) {
        log.emit(LogLevel::Warning, "Source root could not be fully read, nothing will be removed");
        return out;
    }

    for rel in orphans(mapper, source, replica) {
        let path = mapper.resolve(&rel, TreeSide::Replica);

        if !fs.exists(&path) {
            log.emit(LogLevel::Verbose, &format!("{} is already gone", path.display()));
            continue;
        }

        match fs.remove(&path) {
            Ok(()) => {
                log.emit(LogLevel::Info, &format!("Removed {} (not in source)", path.display()));
                out.removed += 1;
            }
            Err(e) => {
                log.emit(LogLevel::Error, &format!("Failed to remove {}: {e}", path.display()));
                out.failed += 1;
                out.errors.push(MirrorError::io(path, e));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entry::{Entry, EntryKind};
    use std::path::PathBuf;

    fn mapper() -> PathMapper {
        PathMapper::new(&Config {
            source_root:      "/src".into(),
            replica_root:     "/rep".into(),
            sync_permissions: false,
            log_file:         None,
            debug:            false,
        })
    }

    fn tree(side: TreeSide, root: &str, paths: &[(&str, EntryKind)]) -> Tree {
        Tree {
            side,
            entries: paths
                .iter()
                .map(|(p, kind)| Entry {
                    path: PathBuf::from(root).join(p),
                    kind: *kind,
                    len: 0,
                    side,
                })
                .collect(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn orphans_come_deepest_first() {
        let source = tree(TreeSide::Source, "/src", &[("keep.txt", EntryKind::File)]);
        let replica = tree(
            TreeSide::Replica,
            "/rep",
            &[
                ("keep.txt", EntryKind::File),
                ("old", EntryKind::Dir),
                ("old/inner", EntryKind::Dir),
                ("old/inner/f.txt", EntryKind::File),
                ("orphan.txt", EntryKind::File),
            ],
        );

        let got = orphans(&mapper(), &source, &replica);
        assert_eq!(
            got,
            ["old/inner/f.txt", "old/inner", "old", "orphan.txt"].map(RelativePath::new)
        );
    }

    #[test]
    fn unreadable_source_subtree_is_protected() {
        let mut source = tree(TreeSide::Source, "/src", &[("locked", EntryKind::Dir)]);
        source.errors.push(MirrorError::PermissionDenied("/src/locked".into()));
        let replica = tree(
            TreeSide::Replica,
            "/rep",
            &[("locked", EntryKind::Dir), ("locked/secret.txt", EntryKind::File)],
        );

        assert!(orphans(&mapper(), &source, &replica).is_empty());
    }

    #[test]
    fn unreadable_source_root_protects_everything() {
        let mut source = tree(TreeSide::Source, "/src", &[]);
        source.errors.push(MirrorError::PermissionDenied("/src".into()));
        let replica = tree(
            TreeSide::Replica,
            "/rep",
            &[("precious.txt", EntryKind::File), ("d", EntryKind::Dir), ("d/y", EntryKind::File)],
        );

        assert!(orphans(&mapper(), &source, &replica).is_empty());
    }

    #[test]
    fn pathless_source_error_protects_everything() {
        let mut source = tree(TreeSide::Source, "/src", &[("a.txt", EntryKind::File)]);
        source.errors.push(MirrorError::Walk("partial read".into()));
        let replica = tree(TreeSide::Replica, "/rep", &[("stale.txt", EntryKind::File)]);

        assert!(orphans(&mapper(), &source, &replica).is_empty());
    }

    #[test]
    fn matching_trees_have_no_orphans() {
        let entries = [("a", EntryKind::Dir), ("a/b.txt", EntryKind::File)];
        let source = tree(TreeSide::Source, "/src", &entries);
        let replica = tree(TreeSide::Replica, "/rep", &entries);
        assert!(orphans(&mapper(), &source, &replica).is_empty());
    }
}
