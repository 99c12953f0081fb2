//! System-level operations (sync, partition re-read, power-off).

use crate::HalResult;
use std::path::Path;

pub trait SystemOps {
    /// Flush filesystem buffers. Can take a long time on slow USB media.
    fn sync(&self) -> HalResult<()>;

    /// Ask the kernel to re-read the partition table of `disk`.
    fn partprobe(&self, disk: &Path, dry_run: bool) -> HalResult<()>;

    /// Power off a removable device (`udisksctl power-off`).
    fn power_off(&self, disk: &Path, dry_run: bool) -> HalResult<()>;

    /// Whether the current process runs with effective UID 0.
    fn is_root(&self) -> bool;
}
