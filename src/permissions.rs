//! Ownership and permission descriptors, and the reconciler that pushes a
//! source descriptor onto its replica counterpart.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::MirrorError;
use crate::log::LogLevel;
use crate::traits::{Filesystem, OperationLog};

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Which principal a set of permission bits applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionClass {
    User,
    Group,
    Other,
    /// setuid / setgid / sticky.
    Special,
}

/// One access-control entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessEntry {
    Owner(u32),
    Group(u32),
    /// The three permission bits of one class, right-aligned (`0..=7`).
    Mode { class: PermissionClass, bits: u8 },
    /// Platforms without Unix modes only carry a read-only flag.
    ReadOnly,
}

/// The ownership and access metadata of one path.
///
/// Compared as an unordered set of entries. Applying a descriptor replaces
/// the target's metadata wholesale; descriptors are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDescriptor {
    entries: BTreeSet<AccessEntry>,
}

impl PermissionDescriptor {
    pub fn new(entries: impl IntoIterator<Item = AccessEntry>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    /// Build a descriptor from a Unix owner, group and mode.
    pub fn from_unix(uid: u32, gid: u32, mode: u32) -> Self {
        let class = |class, shift: u32| AccessEntry::Mode {
            class,
            bits: ((mode >> shift) & 0o7) as u8,
        };
        Self::new([
            AccessEntry::Owner(uid),
            AccessEntry::Group(gid),
            class(PermissionClass::Special, 9),
            class(PermissionClass::User, 6),
            class(PermissionClass::Group, 3),
            class(PermissionClass::Other, 0),
        ])
    }

    pub fn entries(&self) -> impl Iterator<Item = &AccessEntry> {
        self.entries.iter()
    }

    pub fn owner(&self) -> Option<u32> {
        self.entries.iter().find_map(|e| match e {
            AccessEntry::Owner(uid) => Some(*uid),
            _ => None,
        })
    }

    pub fn group(&self) -> Option<u32> {
        self.entries.iter().find_map(|e| match e {
            AccessEntry::Group(gid) => Some(*gid),
            _ => None,
        })
    }

    /// Reassemble the Unix mode bits (`0o7777` mask) from the entries.
    pub fn mode(&self) -> u32 {
        self.entries.iter().fold(0, |mode, e| match e {
            AccessEntry::Mode { class, bits } => {
                let shift = match class {
                    PermissionClass::Special => 9,
                    PermissionClass::User    => 6,
                    PermissionClass::Group   => 3,
                    PermissionClass::Other   => 0,
                };
                mode | (u32::from(*bits) << shift)
            }
            _ => mode,
        })
    }

    pub fn is_readonly(&self) -> bool {
        self.entries.contains(&AccessEntry::ReadOnly)
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Outcome of one reconciliation.
#[derive(Debug)]
pub enum Reconciled {
    /// Descriptors already matched.
    InSync,
    /// The source descriptor was written onto the replica.
    Applied,
    /// Reading or writing failed. The error has been logged.
    Failed(MirrorError),
}

/// Make the replica's descriptor equal to the source's.
///
/// Read and write failures are logged as `Error` and reported as
/// [`Reconciled::Failed`]; they never abort the run.
pub fn reconcile(
    fs: &dyn Filesystem,
    log: &dyn OperationLog,
    source: &Path,
    replica: &Path,
) -> Reconciled {
    let wanted = match fs.read_permissions(source) {
        Ok(d) => d,
        Err(e) => {
            log.emit(LogLevel::Error, &format!("Failed to read permissions of {}: {e}", source.display()));
            return Reconciled::Failed(MirrorError::io(source.to_path_buf(), e));
        }
    };
    let current = match fs.read_permissions(replica) {
        Ok(d) => d,
        Err(e) => {
            log.emit(LogLevel::Error, &format!("Failed to read permissions of {}: {e}", replica.display()));
            return Reconciled::Failed(MirrorError::io(replica.to_path_buf(), e));
        }
    };

    if wanted == current {
        log.emit(LogLevel::Verbose, &format!("Permissions of {} already match", replica.display()));
        return Reconciled::InSync;
    }

    match fs.write_permissions(replica, &wanted) {
        Ok(()) => {
            log.emit(LogLevel::Info, &format!("Updated permissions of {}", replica.display()));
            Reconciled::Applied
        }
        Err(e) => {
            log.emit(LogLevel::Error, &format!("Failed to set permissions of {}: {e}", replica.display()));
            Reconciled::Failed(MirrorError::io(replica.to_path_buf(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_mode_round_trips_through_entries() {
        let d = PermissionDescriptor::from_unix(1000, 100, 0o4755);
        assert_eq!(d.mode(), 0o4755);
        assert_eq!(d.owner(), Some(1000));
        assert_eq!(d.group(), Some(100));
        assert!(!d.is_readonly());
    }

    #[test]
    fn equality_ignores_entry_order() {
        let a = PermissionDescriptor::new([AccessEntry::Owner(1), AccessEntry::Group(2), AccessEntry::ReadOnly]);
        let b = PermissionDescriptor::new([AccessEntry::ReadOnly, AccessEntry::Group(2), AccessEntry::Owner(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn any_differing_entry_breaks_equality() {
        let a = PermissionDescriptor::from_unix(1000, 100, 0o644);
        assert_ne!(a, PermissionDescriptor::from_unix(1000, 100, 0o640));
        assert_ne!(a, PermissionDescriptor::from_unix(1001, 100, 0o644));
        assert_ne!(a, PermissionDescriptor::from_unix(1000, 101, 0o644));
    }
}
