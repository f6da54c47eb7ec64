use std::path::PathBuf;

/// Settings for one mirroring run.
///
/// Built once by [`MirrorBuilder::build()`](crate::MirrorBuilder::build) and
/// only ever read afterwards. Both roots are absolute and lexically
/// normalized, so every component can compare paths structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the tree being mirrored.
    pub source_root: PathBuf,

    /// Root of the tree made identical to the source.
    pub replica_root: PathBuf,

    /// Push ownership and permission bits from source to replica.
    pub sync_permissions: bool,

    /// Where persisted log events go. Consumed by the binary, not the engine.
    pub log_file: Option<PathBuf>,

    /// Persist verbose events to the log file too.
    pub debug: bool,
}
