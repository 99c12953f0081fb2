//! Device probing operations (lsblk, /proc, device nodes).

use crate::{BlockDevice, HalResult};
use std::path::{Path, PathBuf};

pub trait ProbeOps {
    /// List top-level block devices (`lsblk -J -d`).
    fn lsblk_disks(&self) -> HalResult<Vec<BlockDevice>>;

    /// Return mountpoints for partitions on the given disk (best-effort).
    fn lsblk_mountpoints(&self, disk: &Path) -> HalResult<Vec<PathBuf>>;

    /// Whether `path` resolves to a block special file.
    fn is_block_device(&self, path: &Path) -> bool;

    /// Raw contents of `/proc/self/mountinfo`.
    fn proc_mountinfo(&self) -> HalResult<String>;
}
