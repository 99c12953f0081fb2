//! Formatting and content mirroring.
//!
//! FAT32 cannot hold files over 4 GiB, so the boot partition gets the ISO minus `sources/`
//! plus `sources/boot.wim` alone; the NTFS partition gets a full mirror (including the large
//! `install.wim`/`install.esd`).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::device::TargetDevice;
use crate::version::resolve_case_insensitive;
use crate::writer::cancel_requested;
use winusb_error::WinUsbError;
use winusb_hal::{FormatOptions, InstallerHal, RsyncOptions};

/// ISO-relative path of the WinPE image Windows Setup boots from.
pub const BOOT_WIM: &str = "sources/boot.wim";

pub fn format_partitions(
    hal: &dyn InstallerHal,
    device: &TargetDevice,
    boot_label: &str,
    install_label: &str,
    opts: &FormatOptions,
) -> Result<()> {
    let boot = device.boot_partition();
    let install = device.install_partition();

    log::info!("✨ Formatting {} as FAT32 ({})", boot.display(), boot_label);
    hal.format_vfat(&boot, boot_label, opts)
        .with_context(|| format!("Failed to format {}", boot.display()))?;

    log::info!("✨ Formatting {} as NTFS ({})", install.display(), install_label);
    hal.format_ntfs(&install, install_label, opts)
        .with_context(|| format!("Failed to format {}", install.display()))?;

    Ok(())
}

/// Route one rsync stdout line to the log; returning false aborts the transfer.
fn log_progress(line: &str) -> bool {
    let trimmed = line.trim();
    // `--progress` status lines: "  1,234,567  42%  10.00MB/s    0:00:03"
    if trimmed.contains('%') && trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        log::debug!("   {}", trimmed);
    } else {
        log::info!("📦 {}", trimmed);
    }
    !cancel_requested()
}

fn mirror(
    hal: &dyn InstallerHal,
    src: &Path,
    dst: &Path,
    opts: &RsyncOptions,
) -> Result<()> {
    let mut on_line = |line: &str| log_progress(line);
    let copied = hal.rsync_stream_stdout(src, dst, opts, &mut on_line);
    // A transfer stopped by the progress callback surfaces as a HAL error.
    if cancel_requested() {
        return Err(WinUsbError::Cancelled.into());
    }
    copied.with_context(|| format!("Failed to copy {} -> {}", src.display(), dst.display()))?;
    Ok(())
}

/// Everything except `sources/`, then `sources/boot.wim` on its own.
pub fn copy_boot_files(
    hal: &dyn InstallerHal,
    iso_root: &Path,
    boot_mount: &Path,
    dry_run: bool,
) -> Result<()> {
    log::info!("📦 Copying boot files to {}", boot_mount.display());
    let opts = RsyncOptions::mirror().exclude("/sources").dry_run(dry_run);
    mirror(hal, iso_root, boot_mount, &opts)?;

    if dry_run {
        log::info!("DRY RUN: copy {} -> {}", BOOT_WIM, boot_mount.display());
        return Ok(());
    }

    let boot_wim = resolve_case_insensitive(iso_root, BOOT_WIM).ok_or_else(|| {
        WinUsbError::ValidationFailed(format!("{} not found in ISO", BOOT_WIM))
    })?;
    let sources = boot_mount.join("sources");
    fs::create_dir_all(&sources)
        .with_context(|| format!("Failed to create {}", sources.display()))?;
    let target = sources.join("boot.wim");
    fs::copy(&boot_wim, &target).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            boot_wim.display(),
            target.display()
        )
    })?;
    log::info!("📦 {}", BOOT_WIM);
    Ok(())
}

/// Full mirror of the ISO.
pub fn copy_install_files(
    hal: &dyn InstallerHal,
    iso_root: &Path,
    install_mount: &Path,
    dry_run: bool,
) -> Result<()> {
    log::info!("📦 Copying installer files to {}", install_mount.display());
    let opts = RsyncOptions::mirror().dry_run(dry_run);
    mirror(hal, iso_root, install_mount, &opts)
}
