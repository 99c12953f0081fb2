//! Mount operations trait.

use crate::HalResult;
use std::path::Path;

/// Filesystem type that is mounted through the `ntfs-3g` FUSE helper instead of mount(2).
pub const NTFS_3G: &str = "ntfs-3g";

/// Trait for mounting and unmounting filesystems.
pub trait MountOps {
    /// Mount a device to a target path.
    ///
    /// # Arguments
    /// * `device` - Device path (e.g., `/dev/sdb1`, `/dev/loop0`)
    /// * `target` - Mount point path
    /// * `fstype` - Filesystem type (e.g., `"vfat"`, `"ntfs3"`, `"udf"`)
    /// * `options` - Mount options
    /// * `dry_run` - If true, log the operation but don't execute it
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: Option<&str>,
        options: MountOptions,
        dry_run: bool,
    ) -> HalResult<()>;

    /// Unmount a filesystem.
    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()>;

    /// Check if a path is currently a mount point.
    fn is_mounted(&self, path: &Path) -> HalResult<bool>;
}

/// Mount options and flags.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    /// Additional mount options as a comma-separated string (e.g., "uid=0,umask=022")
    pub options: Option<String>,
    /// Mount read-only (`MS_RDONLY`).
    pub read_only: bool,
}

impl MountOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self {
            options: None,
            read_only: true,
        }
    }
}
