//! HAL trait definitions and implementations.
//!
//! This module defines the traits for world-touching operations and provides both the real
//! (`LinuxHal`) and the recording (`FakeHal`) implementations.

pub mod fake_hal;
pub mod format_ops;
pub mod guards;
pub mod linux_hal;
pub mod loop_ops;
pub mod mount_ops;
pub mod partition_ops;
pub mod probe_ops;
pub mod process_ops;
pub mod rsync_ops;
pub mod system_ops;

pub use fake_hal::{FakeHal, Operation};
pub use format_ops::{FormatOps, FormatOptions};
pub use guards::{LoopGuard, MountGuard};
pub use linux_hal::LinuxHal;
pub use loop_ops::LoopOps;
pub use mount_ops::{MountOps, MountOptions, NTFS_3G};
pub use partition_ops::{parted_args, PartedOp, PartedOptions, PartitionOps, WipeFsOptions};
pub use probe_ops::ProbeOps;
pub use process_ops::ProcessOps;
pub use rsync_ops::{rsync_args, RsyncOps, RsyncOptions};
pub use system_ops::SystemOps;

/// Complete HAL used by the provisioning workflow.
pub trait InstallerHal:
    ProcessOps
    + PartitionOps
    + FormatOps
    + MountOps
    + RsyncOps
    + ProbeOps
    + LoopOps
    + SystemOps
    + Send
    + Sync
{
}

/// Automatically implement InstallerHal for any type implementing all required traits.
impl<T> InstallerHal for T where
    T: ProcessOps
        + PartitionOps
        + FormatOps
        + MountOps
        + RsyncOps
        + ProbeOps
        + LoopOps
        + SystemOps
        + Send
        + Sync
{
}
