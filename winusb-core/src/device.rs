//! Target device selection and validation.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::prompt::Prompter;
use winusb_error::WinUsbError;
use winusb_hal::path::partition_path;
use winusb_hal::procfs::mountinfo::root_mount_source;
use winusb_hal::{BlockDevice, ProbeOps};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDevice {
    /// Kernel name, e.g. `sdb`.
    pub name: String,
    /// Device node, e.g. `/dev/sdb`.
    pub path: PathBuf,
}

/// Accept `sdb` or `/dev/sdb`; return the bare kernel name.
pub fn normalize_device_name(input: &str) -> Result<String, WinUsbError> {
    let trimmed = input.trim();
    let name = trimmed.strip_prefix("/dev/").unwrap_or(trimmed);
    if name.is_empty() {
        return Err(WinUsbError::InvalidDevice("device name is required".to_string()));
    }
    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(WinUsbError::InvalidDevice(format!(
            "not a device name: {:?}",
            trimmed
        )));
    }
    Ok(name.to_string())
}

impl TargetDevice {
    /// Build a target from operator input; the node must be a block special file.
    pub fn validate<H: ProbeOps + ?Sized>(input: &str, hal: &H) -> Result<Self, WinUsbError> {
        let name = normalize_device_name(input)?;
        let path = Path::new("/dev").join(&name);
        if !hal.is_block_device(&path) {
            return Err(WinUsbError::InvalidDevice(format!(
                "{} is not a block device",
                path.display()
            )));
        }
        Ok(Self { name, path })
    }

    pub fn partition(&self, num: u32) -> PathBuf {
        PathBuf::from(partition_path(&self.path.to_string_lossy(), num))
    }

    /// FAT32 boot partition (first).
    pub fn boot_partition(&self) -> PathBuf {
        self.partition(1)
    }

    /// NTFS install partition (second).
    pub fn install_partition(&self) -> PathBuf {
        self.partition(2)
    }

    /// Best-effort risk notes: the disk backs `/` or has mounted partitions.
    pub fn safety_warnings<H: ProbeOps + ?Sized>(&self, hal: &H) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Ok(mountinfo) = hal.proc_mountinfo() {
            if let Some(root) = root_mount_source(&mountinfo) {
                if belongs_to_disk(&root, &self.path) {
                    warnings.push(format!(
                        "{} holds the running root filesystem ({})",
                        self.path.display(),
                        root
                    ));
                }
            }
        }

        if let Ok(mounts) = hal.lsblk_mountpoints(&self.path) {
            if !mounts.is_empty() {
                let list: Vec<String> = mounts.iter().map(|m| m.display().to_string()).collect();
                warnings.push(format!(
                    "{} has mounted partitions: {}",
                    self.path.display(),
                    list.join(", ")
                ));
            }
        }

        warnings
    }
}

/// Whether `source` is `disk` itself or one of its partitions (`sdb1`, `nvme0n1p2`).
fn belongs_to_disk(source: &str, disk: &Path) -> bool {
    let disk = disk.to_string_lossy();
    let Some(rest) = source.strip_prefix(disk.as_ref()) else {
        return false;
    };
    let digits = rest.strip_prefix('p').unwrap_or(rest);
    rest.is_empty() || (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

pub fn list_disks<H: ProbeOps + ?Sized>(hal: &H) -> Result<Vec<BlockDevice>> {
    let disks: Vec<BlockDevice> = hal.lsblk_disks()?.into_iter().filter(|d| d.is_disk()).collect();
    Ok(disks)
}

fn describe(disk: &BlockDevice) -> String {
    format!(
        "{:<10} {:>8}  {:<20} {}",
        disk.name,
        disk.size.as_deref().unwrap_or("?"),
        disk.mountpoint.as_deref().unwrap_or(""),
        disk.model.as_deref().unwrap_or("").trim()
    )
}

pub fn prompt_for_device<H: ProbeOps + ?Sized>(
    hal: &H,
    prompter: &dyn Prompter,
) -> Result<TargetDevice> {
    let disks = list_disks(hal)?;
    let mut rows = vec![format!("{:<10} {:>8}  {:<20} MODEL", "NAME", "SIZE", "MOUNTPOINT")];
    rows.extend(disks.iter().map(describe));
    prompter.menu("💾 Block devices", &rows)?;
    let answer = prompter.input("Target device (e.g. sdb) - ALL DATA ON IT WILL BE LOST")?;
    Ok(TargetDevice::validate(&answer, hal)?)
}
