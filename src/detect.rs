use crate::entry::Entry;

/// What to do with one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    /// No replica counterpart exists.
    Create,

    /// The replica counterpart exists but its length differs.
    Update,

    /// Lengths match. Content is assumed identical.
    Unchanged,
}

/// Decide whether `source` needs to be copied.
///
/// `replica_len` is the byte length of the replica counterpart, or `None`
/// when there is none. Only lengths are compared: two files of the same size
/// are treated as identical even if their bytes differ. No hashing and no
/// timestamps.
pub fn decide(source: &Entry, replica_len: Option<u64>) -> SyncDecision {
    match replica_len {
        None                        => SyncDecision::Create,
        Some(len) if len != source.len => SyncDecision::Update,
        Some(_)                     => SyncDecision::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryKind, TreeSide};

    fn file(len: u64) -> Entry {
        Entry {
            path: "/src/f.txt".into(),
            kind: EntryKind::File,
            len,
            side: TreeSide::Source,
        }
    }

    #[test]
    fn missing_replica_is_create() {
        assert_eq!(decide(&file(10), None), SyncDecision::Create);
    }

    #[test]
    fn different_length_is_update() {
        assert_eq!(decide(&file(10), Some(9)), SyncDecision::Update);
        assert_eq!(decide(&file(0), Some(1)), SyncDecision::Update);
    }

    #[test]
    fn same_length_is_unchanged() {
        assert_eq!(decide(&file(10), Some(10)), SyncDecision::Unchanged);
        assert_eq!(decide(&file(0), Some(0)), SyncDecision::Unchanged);
    }
}
