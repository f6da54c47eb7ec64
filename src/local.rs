use std::fs;
use std::io;
use std::path::Path;

use crate::entry::{Entry, EntryKind, TreeSide};
use crate::error::MirrorError;
use crate::permissions::PermissionDescriptor;
use crate::traits::Filesystem;
use crate::walk::walk_local;

/// [`Filesystem`] backed by the host's local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn walk(&self, root: &Path, side: TreeSide) -> Box<dyn Iterator<Item = Result<Entry, MirrorError>>> {
        Box::new(walk_local(root, side))
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn entry_kind(&self, path: &Path) -> io::Result<Option<EntryKind>> {
        let ft = match fs::symlink_metadata(path) {
            Ok(meta) => meta.file_type(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(if ft.is_dir() {
            EntryKind::Dir
        } else if ft.is_file() {
            EntryKind::File
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        }))
    }

    fn file_len(&self, path: &Path) -> io::Result<Option<u64>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Err(io::Error::other("not a regular file")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<u64> {
        // A read-only replica file cannot be opened for writing
        if let Ok(meta) = fs::symlink_metadata(to) {
            let mut perms = meta.permissions();
            if meta.is_file() && perms.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                perms.set_readonly(false);
                fs::set_permissions(to, perms)?;
            }
        }
        fs::copy(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn read_permissions(&self, path: &Path) -> io::Result<PermissionDescriptor> {
        let meta = fs::symlink_metadata(path)?;
        Ok(descriptor_of(&meta))
    }

    fn write_permissions(&self, path: &Path, descriptor: &PermissionDescriptor) -> io::Result<()> {
        apply_descriptor(path, descriptor)
    }

    fn can_write_permissions(&self) -> bool {
        is_privileged()
    }
}

// ---------------------------------------------------------------------------
// Platform specifics
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn descriptor_of(meta: &fs::Metadata) -> PermissionDescriptor {
    use std::os::unix::fs::MetadataExt;
    PermissionDescriptor::from_unix(meta.uid(), meta.gid(), meta.mode() & 0o7777)
}

#[cfg(not(unix))]
fn descriptor_of(meta: &fs::Metadata) -> PermissionDescriptor {
    use crate::permissions::AccessEntry;
    if meta.permissions().readonly() {
        PermissionDescriptor::new([AccessEntry::ReadOnly])
    } else {
        PermissionDescriptor::default()
    }
}

#[cfg(unix)]
fn apply_descriptor(path: &Path, descriptor: &PermissionDescriptor) -> io::Result<()> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};

    let meta = fs::symlink_metadata(path)?;
    let owner = descriptor.owner().filter(|uid| *uid != meta.uid());
    let group = descriptor.group().filter(|gid| *gid != meta.gid());
    if owner.is_some() || group.is_some() {
        std::os::unix::fs::chown(path, owner, group)?;
    }

    // chown may clear setuid/setgid, so the mode goes last
    fs::set_permissions(path, fs::Permissions::from_mode(descriptor.mode()))
}

#[cfg(not(unix))]
fn apply_descriptor(path: &Path, descriptor: &PermissionDescriptor) -> io::Result<()> {
    let mut perms = fs::symlink_metadata(path)?.permissions();
    perms.set_readonly(descriptor.is_readonly());
    fs::set_permissions(path, perms)
}

#[cfg(unix)]
fn is_privileged() -> bool {
    rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_privileged() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_len_of_missing_path_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(LocalFs.file_len(&dir.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn file_len_refuses_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalFs.file_len(dir.path()).is_err());
    }

    #[test]
    fn entry_kind_does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("f"), "x").unwrap();
        fs::create_dir(dir.path().join("d")).unwrap();

        assert_eq!(LocalFs.entry_kind(&dir.path().join("f")).unwrap(), Some(EntryKind::File));
        assert_eq!(LocalFs.entry_kind(&dir.path().join("d")).unwrap(), Some(EntryKind::Dir));
        assert_eq!(LocalFs.entry_kind(&dir.path().join("none")).unwrap(), None);

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("d"), dir.path().join("l")).unwrap();
            assert_eq!(LocalFs.entry_kind(&dir.path().join("l")).unwrap(), Some(EntryKind::Symlink));
            assert!(LocalFs.file_len(&dir.path().join("l")).is_err());
            assert!(LocalFs.is_dir(&dir.path().join("l")));
        }
    }

    #[test]
    fn copy_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");
        fs::write(&from, "new content").unwrap();
        fs::write(&to, "old").unwrap();

        LocalFs.copy_file(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "new content");
    }

    #[test]
    fn copy_replaces_read_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from");
        let to = dir.path().join("to");
        fs::write(&from, "fresh").unwrap();
        fs::write(&to, "stale!").unwrap();
        let mut perms = fs::metadata(&to).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&to, perms).unwrap();

        LocalFs.copy_file(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "fresh");
    }

    #[test]
    fn remove_handles_files_and_non_empty_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(sub.join("deep")).unwrap();
        fs::write(sub.join("deep/f"), "x").unwrap();
        fs::write(dir.path().join("g"), "y").unwrap();

        LocalFs.remove(&sub).unwrap();
        LocalFs.remove(&dir.path().join("g")).unwrap();
        assert!(!LocalFs.exists(&sub));
        assert!(!LocalFs.exists(&dir.path().join("g")));
    }

    #[cfg(unix)]
    #[test]
    fn mode_round_trips_through_descriptor() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();
        fs::set_permissions(&a, fs::Permissions::from_mode(0o640)).unwrap();
        fs::set_permissions(&b, fs::Permissions::from_mode(0o644)).unwrap();

        let wanted = LocalFs.read_permissions(&a).unwrap();
        assert_ne!(wanted, LocalFs.read_permissions(&b).unwrap());

        LocalFs.write_permissions(&b, &wanted).unwrap();
        assert_eq!(LocalFs.read_permissions(&b).unwrap(), wanted);
        assert_eq!(fs::metadata(&b).unwrap().permissions().mode() & 0o7777, 0o640);
    }
}
