use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use super::config::{WriterConfig, WriterContext};
use super::mounts::MountPoints;
use crate::boot_mode::{prompt_for_mode, BootMode};
use crate::copy::{copy_boot_files, copy_install_files, format_partitions};
use crate::device::{prompt_for_device, TargetDevice};
use crate::iso::{prompt_for_iso, resolve_explicit_iso};
use crate::partitioning::{partition_device, PartitionOptions};
use crate::prompt::Prompter;
use crate::verify::verify_boot_files;
use crate::version::{detect_version, WindowsVersion};
use winusb_hal::{FormatOptions, InstallerHal, LoopGuard, MountGuard, MountOptions};

/// ISO filesystems tried in order; Windows media is UDF with an ISO9660 bridge.
const ISO_FSTYPES: [&str; 2] = ["udf", "iso9660"];

/// Write a Windows ISO to a USB stick.
///
/// Selection (ISO, boot mode, device) happens first and is skipped for anything already set
/// in `cfg`. From partitioning on, all three mount points are guarded: a failure at any
/// later step unmounts each of them once and detaches the ISO loop device.
pub fn run(cfg: &WriterConfig, hal: &dyn InstallerHal, prompter: &dyn Prompter) -> Result<()> {
    info!("💾 winusb: bootable Windows installer USB");
    if cfg.dry_run {
        info!("🧪 DRY-RUN MODE - No changes will be made");
    }

    let mut ctx = WriterContext {
        hal,
        dry_run: cfg.dry_run,
        confirmed: false,
    };

    let iso = select_iso(cfg, prompter)?;
    ctx.check_cancel()?;
    let mode = match cfg.mode {
        Some(mode) => mode,
        None => prompt_for_mode(prompter)?,
    };
    ctx.check_cancel()?;
    let device = match cfg.device.as_deref() {
        Some(name) => TargetDevice::validate(name, hal)?,
        None => prompt_for_device(hal, prompter)?,
    };

    info!("📀 ISO: {}", iso.display());
    info!("🥾 Boot mode: {}", mode);
    info!("💾 Target: {}", device.path.display());

    confirm_destructive(&mut ctx, cfg, &device, prompter)?;
    ctx.check_cancel()?;

    let mounts = MountPoints::new(&cfg.config.mounts);
    mounts.ensure_dirs()?;
    mounts.release_stale(hal, ctx.dry_run)?;

    // Armed before partitioning: from the first mkpart on, any failure must unmount each
    // mount point once. The loop guard is declared first so it drops after them.
    let mut iso_loop = None;
    let iso_guard = MountGuard::new(hal, mounts.iso.clone(), ctx.dry_run);
    let boot_guard = MountGuard::new(hal, mounts.boot.clone(), ctx.dry_run);
    let install_guard = MountGuard::new(hal, mounts.install.clone(), ctx.dry_run);

    let written = partition_device(
        hal,
        &device,
        mode,
        &PartitionOptions {
            dry_run: ctx.dry_run,
            confirmed: ctx.confirmed,
            settle_delay: cfg.settle_delay(),
        },
    )
    .and_then(|()| {
        write_media(
            &ctx,
            cfg,
            &iso,
            mode,
            &device,
            &mounts,
            prompter,
            &mut iso_loop,
        )
    });

    if let Err(err) = written {
        ctx.status("🧹 Cleaning up...");
        drop(install_guard);
        drop(boot_guard);
        drop(iso_guard);
        drop(iso_loop);
        warn!(
            "⚠️ Write failed; manual cleanup may be required (check {} and {})",
            mounts.iso.display(),
            device.path.display()
        );
        return Err(err);
    }

    teardown(&ctx, &device, [iso_guard, boot_guard, install_guard], iso_loop);
    info!("🎉 {} is ready", device.path.display());
    Ok(())
}

/// Detect the Windows version of an already-mounted or extracted ISO tree.
pub fn detect_only(
    iso_root: &Path,
    hal: &dyn InstallerHal,
    wiminfo_available: bool,
) -> Result<WindowsVersion> {
    if !iso_root.is_dir() {
        anyhow::bail!("Not a directory: {}", iso_root.display());
    }
    Ok(detect_version(iso_root, hal, wiminfo_available))
}

fn select_iso(cfg: &WriterConfig, prompter: &dyn Prompter) -> Result<PathBuf> {
    match cfg.iso.as_deref() {
        Some(path) => resolve_explicit_iso(path),
        None => prompt_for_iso(&cfg.config.iso_dir, prompter),
    }
}

/// The only gate in front of the wipe: risk warnings and a press-Enter pause.
fn confirm_destructive(
    ctx: &mut WriterContext<'_>,
    cfg: &WriterConfig,
    device: &TargetDevice,
    prompter: &dyn Prompter,
) -> Result<()> {
    for warning in device.safety_warnings(ctx.hal) {
        warn!("⚠️ {}", warning);
    }
    warn!("🔥 ALL DATA ON {} WILL BE ERASED", device.path.display());
    if cfg.assume_yes {
        info!("⏩ --yes given, not pausing");
    } else {
        prompter.pause("Press Enter to continue or Ctrl+C to abort")?;
    }
    ctx.confirmed = true;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_media<'a>(
    ctx: &WriterContext<'a>,
    cfg: &WriterConfig,
    iso: &Path,
    mode: BootMode,
    device: &TargetDevice,
    mounts: &MountPoints,
    prompter: &dyn Prompter,
    iso_loop: &mut Option<LoopGuard<'a, dyn InstallerHal + 'a>>,
) -> Result<()> {
    let hal = ctx.hal;

    ctx.check_cancel()?;
    if ctx.dry_run {
        info!(
            "DRY RUN: losetup -r {} and mount it at {}",
            iso.display(),
            mounts.iso.display()
        );
        info!("DRY RUN: skipping Windows version detection");
    } else {
        let loop_device = hal
            .losetup_attach(iso, true)
            .with_context(|| format!("Failed to attach {}", iso.display()))?;
        let guard = iso_loop.insert(LoopGuard::new(hal, loop_device));
        mount_iso(ctx, Path::new(guard.device()), &mounts.iso)?;
        detect_version(&mounts.iso, hal, cfg.wiminfo_available);
    }

    ctx.check_cancel()?;
    format_partitions(
        hal,
        device,
        &cfg.config.boot_label,
        &cfg.config.install_label,
        &FormatOptions::new(ctx.dry_run, ctx.confirmed),
    )?;

    ctx.check_cancel()?;
    let boot = device.boot_partition();
    hal.mount_device(&boot, &mounts.boot, Some("vfat"), MountOptions::new(), ctx.dry_run)
        .with_context(|| format!("Failed to mount {}", boot.display()))?;
    let install = device.install_partition();
    let ntfs = cfg.config.ntfs_driver.fstype();
    hal.mount_device(&install, &mounts.install, Some(ntfs), MountOptions::new(), ctx.dry_run)
        .with_context(|| format!("Failed to mount {} ({})", install.display(), ntfs))?;

    ctx.check_cancel()?;
    copy_boot_files(hal, &mounts.iso, &mounts.boot, ctx.dry_run)?;
    ctx.check_cancel()?;
    copy_install_files(hal, &mounts.iso, &mounts.install, ctx.dry_run)?;

    ctx.check_cancel()?;
    if ctx.dry_run {
        info!("DRY RUN: skipping boot file verification");
    } else {
        verify_boot_files(&mounts.boot, mode, cfg.assume_yes, prompter)?;
    }
    Ok(())
}

fn mount_iso(ctx: &WriterContext<'_>, loop_device: &Path, target: &Path) -> Result<()> {
    let mut last_err = None;
    for fstype in ISO_FSTYPES {
        match ctx.hal.mount_device(
            loop_device,
            target,
            Some(fstype),
            MountOptions::read_only(),
            ctx.dry_run,
        ) {
            Ok(()) => {
                info!("📀 Mounted ISO ({}) at {}", fstype, target.display());
                return Ok(());
            }
            Err(err) => {
                log::debug!("mounting {} as {} failed: {}", loop_device.display(), fstype, err);
                last_err = Some(err);
            }
        }
    }
    let err = last_err
        .map(anyhow::Error::new)
        .unwrap_or_else(|| anyhow::anyhow!("no filesystem type to try"));
    Err(err.context(format!("Failed to mount ISO at {}", target.display())))
}

fn teardown(
    ctx: &WriterContext<'_>,
    device: &TargetDevice,
    guards: [MountGuard<'_, dyn InstallerHal + '_>; 3],
    iso_loop: Option<LoopGuard<'_, dyn InstallerHal + '_>>,
) {
    ctx.status("🧹 Syncing and unmounting...");
    // Second pass catches buffers dirtied while the first was flushing.
    for _ in 0..2 {
        if let Err(err) = ctx.hal.sync() {
            warn!("⚠️ sync failed: {}", err);
        }
    }

    for guard in guards {
        let target = guard.target().to_path_buf();
        if let Err(err) = guard.unmount() {
            warn!("⚠️ Failed to unmount {}: {}", target.display(), err);
        }
    }

    if let Some(guard) = iso_loop {
        let loop_device = guard.device().to_string();
        if let Err(err) = guard.detach() {
            warn!("⚠️ Failed to detach {}: {}", loop_device, err);
        }
    }

    match ctx.hal.power_off(&device.path, ctx.dry_run) {
        Ok(()) => info!("⏏️ {} powered off; safe to remove", device.path.display()),
        Err(err) => warn!(
            "⚠️ Could not power off {}: {} (unmounted, safe to remove after sync)",
            device.path.display(),
            err
        ),
    }
}
