//! Two-partition layout for Windows installer media.
//!
//! `[ FAT32 boot 0%..1GiB | NTFS install 1GiB..100% ]` under a GPT (UEFI) or msdos (MBR)
//! label. The boot partition carries the ESP flag on GPT and the legacy boot flag on msdos.

use anyhow::Result;
use std::time::Duration;

use crate::boot_mode::BootMode;
use crate::device::TargetDevice;
use winusb_error::WinUsbError;
use winusb_hal::{HalError, InstallerHal, PartedOp, PartedOptions, WipeFsOptions};

/// Boundary between the boot and install partitions.
pub const BOOT_PARTITION_END: &str = "1GiB";

#[derive(Debug, Clone)]
pub struct PartitionOptions {
    pub dry_run: bool,
    pub confirmed: bool,
    /// Fixed wait before `partprobe`, for sticks that are slow to surface new nodes.
    pub settle_delay: Duration,
}

/// The `parted` operations for `mode`, in execution order.
pub fn layout_ops(mode: BootMode) -> Vec<PartedOp> {
    vec![
        PartedOp::MkLabel {
            label: mode.table_type().to_string(),
        },
        PartedOp::MkPart {
            part_type: "primary".to_string(),
            fs_type: "fat32".to_string(),
            start: "0%".to_string(),
            end: BOOT_PARTITION_END.to_string(),
        },
        PartedOp::SetFlag {
            part_num: 1,
            flag: mode.boot_flag().to_string(),
            state: "on".to_string(),
        },
        PartedOp::MkPart {
            part_type: "primary".to_string(),
            fs_type: "ntfs".to_string(),
            start: BOOT_PARTITION_END.to_string(),
            end: "100%".to_string(),
        },
    ]
}

fn unmount_existing(hal: &dyn InstallerHal, device: &TargetDevice, dry_run: bool) {
    let mounts = match hal.lsblk_mountpoints(&device.path) {
        Ok(m) => m,
        Err(err) => {
            log::warn!("⚠️ Could not list mountpoints on {}: {}", device.path.display(), err);
            return;
        }
    };
    for mp in mounts {
        log::info!("🔌 Unmounting {}", mp.display());
        if let Err(err) = hal.unmount(&mp, dry_run) {
            log::warn!("⚠️ Failed to unmount {}: {}", mp.display(), err);
        }
    }
}

pub fn partition_device(
    hal: &dyn InstallerHal,
    device: &TargetDevice,
    mode: BootMode,
    opts: &PartitionOptions,
) -> Result<()> {
    let disk = device.path.as_path();
    log::info!("🔪 Partitioning {} for {}", disk.display(), mode);

    unmount_existing(hal, device, opts.dry_run);

    match hal.wipefs_all(disk, &WipeFsOptions::new(opts.dry_run, opts.confirmed)) {
        Ok(()) => {}
        Err(HalError::SafetyLock) => return Err(HalError::SafetyLock.into()),
        Err(err) => log::warn!("⚠️ wipefs failed (continuing, device may already be clean): {}", err),
    }

    let parted_opts = PartedOptions::new(opts.dry_run, opts.confirmed);
    for op in layout_ops(mode) {
        let desc = format!("{:?}", op);
        let is_flag = matches!(op, PartedOp::SetFlag { .. });
        match hal.parted(disk, op, &parted_opts) {
            Ok(_) => {}
            Err(HalError::SafetyLock) => return Err(HalError::SafetyLock.into()),
            Err(err) if is_flag && mode == BootMode::Mbr => {
                log::warn!("⚠️ Could not set boot flag on partition 1: {}", err);
            }
            Err(err) => {
                return Err(WinUsbError::PartitioningFailed(format!("{}: {}", desc, err)).into())
            }
        }
    }

    if !opts.dry_run && !opts.settle_delay.is_zero() {
        std::thread::sleep(opts.settle_delay);
    }
    hal.partprobe(disk, opts.dry_run)?;

    if opts.dry_run {
        log::info!("DRY RUN: skipping partition node check");
        return Ok(());
    }

    let missing: Vec<String> = [device.boot_partition(), device.install_partition()]
        .iter()
        .filter(|p| !hal.is_block_device(p))
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(WinUsbError::PartitionsMissing(missing).into());
    }

    log::info!(
        "📋 {} label with boot ({}) and install ({}) partitions",
        mode.table_type(),
        device.boot_partition().display(),
        device.install_partition().display()
    );
    Ok(())
}
