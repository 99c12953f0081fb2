//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real hardware.

use super::{
    FormatOps, FormatOptions, LoopOps, MountOps, MountOptions, PartedOp, PartedOptions,
    PartitionOps, ProbeOps, ProcessOps, RsyncOps, RsyncOptions, SystemOps, WipeFsOptions,
};
use crate::path::partition_path;
use crate::{BlockDevice, HalError, HalResult};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use walkdir::WalkDir;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command {
        program: String,
        args: Vec<String>,
    },
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: Option<String>,
        read_only: bool,
    },
    Unmount {
        target: PathBuf,
    },
    FormatVfat {
        device: PathBuf,
        label: String,
    },
    FormatNtfs {
        device: PathBuf,
        label: String,
    },
    WipeFsAll {
        disk: PathBuf,
    },
    Parted {
        disk: PathBuf,
        op: String,
    },
    Rsync {
        src: PathBuf,
        dst: PathBuf,
        excludes: Vec<String>,
    },
    Sync,
    Partprobe {
        disk: PathBuf,
    },
    PowerOff {
        disk: PathBuf,
    },
    LosetupAttach {
        image: PathBuf,
        read_only: bool,
        loop_device: String,
    },
    LosetupDetach {
        loop_device: String,
    },
    LsblkDisks,
    LsblkMountpoints {
        disk: PathBuf,
    },
}

impl Operation {
    /// Short name used by [`FakeHal::failing`].
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Command { .. } => "command",
            Operation::Mount { .. } => "mount",
            Operation::Unmount { .. } => "unmount",
            Operation::FormatVfat { .. } => "format_vfat",
            Operation::FormatNtfs { .. } => "format_ntfs",
            Operation::WipeFsAll { .. } => "wipefs",
            Operation::Parted { .. } => "parted",
            Operation::Rsync { .. } => "rsync",
            Operation::Sync => "sync",
            Operation::Partprobe { .. } => "partprobe",
            Operation::PowerOff { .. } => "power_off",
            Operation::LosetupAttach { .. } => "losetup_attach",
            Operation::LosetupDetach { .. } => "losetup_detach",
            Operation::LsblkDisks => "lsblk_disks",
            Operation::LsblkMountpoints { .. } => "lsblk_mountpoints",
        }
    }

    fn matches_failure(&self, key: &str) -> bool {
        if key == self.kind() {
            return true;
        }
        match self {
            Operation::Mount {
                fstype: Some(fstype),
                ..
            } => key == format!("mount:{}", fstype),
            Operation::Command { program, .. } => key == format!("command:{}", program),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct CannedOutput {
    code: i32,
    stdout: String,
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    /// Currently mounted paths
    mounted_paths: HashSet<PathBuf>,
    /// Paths that `is_block_device` reports as block devices
    block_devices: HashSet<PathBuf>,
    /// Partitions created per disk since the last `mklabel`
    partition_counts: HashMap<PathBuf, u32>,
    disks: Vec<BlockDevice>,
    disk_mountpoints: HashMap<PathBuf, Vec<PathBuf>>,
    mountinfo: String,
    command_outputs: HashMap<String, CannedOutput>,
    failing: HashSet<String>,
    is_root: bool,
    mirror_copies: bool,
    next_loop: u32,
}

impl Default for FakeHalState {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            mounted_paths: HashSet::new(),
            block_devices: HashSet::new(),
            partition_counts: HashMap::new(),
            disks: Vec::new(),
            disk_mountpoints: HashMap::new(),
            mountinfo: String::new(),
            command_outputs: HashMap::new(),
            failing: HashSet::new(),
            is_root: true,
            mirror_copies: false,
            next_loop: 0,
        }
    }
}

/// Fake HAL implementation that records operations without executing them.
///
/// Clones share state, so a test can hand one clone to the workflow and inspect another.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `path` as an existing block device.
    pub fn with_block_device(self, path: impl Into<PathBuf>) -> Self {
        self.lock().block_devices.insert(path.into());
        self
    }

    /// Disks returned by `lsblk_disks`.
    pub fn with_disks(self, disks: Vec<BlockDevice>) -> Self {
        self.lock().disks = disks;
        self
    }

    /// Mountpoints returned by `lsblk_mountpoints` for `disk`.
    pub fn with_mountpoints(self, disk: impl Into<PathBuf>, mounts: Vec<PathBuf>) -> Self {
        self.lock().disk_mountpoints.insert(disk.into(), mounts);
        self
    }

    /// Contents returned by `proc_mountinfo`.
    pub fn with_mountinfo(self, mountinfo: impl Into<String>) -> Self {
        self.lock().mountinfo = mountinfo.into();
        self
    }

    /// Canned result for every `command_output` call to `program`.
    pub fn with_command_output(self, program: &str, code: i32, stdout: &str) -> Self {
        self.lock().command_outputs.insert(
            program.to_string(),
            CannedOutput {
                code,
                stdout: stdout.to_string(),
            },
        );
        self
    }

    /// Make every operation matching `key` fail after being recorded.
    ///
    /// `key` is an [`Operation::kind`], or `mount:<fstype>` / `command:<program>` to narrow it.
    pub fn failing(self, key: &str) -> Self {
        self.lock().failing.insert(key.to_string());
        self
    }

    pub fn with_root(self, is_root: bool) -> Self {
        self.lock().is_root = is_root;
        self
    }

    /// Make `rsync_stream_stdout` mirror the source tree on the real filesystem.
    pub fn with_mirroring(self) -> Self {
        self.lock().mirror_copies = true;
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.lock().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.lock().operations.iter().any(check)
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.operations.clear();
        state.mounted_paths.clear();
    }

    fn lock(&self) -> MutexGuard<'_, FakeHalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `op`, then fail it if a matching failure was requested.
    fn record_operation(&self, op: Operation) -> HalResult<()> {
        let mut state = self.lock();
        let fail = state.failing.iter().any(|key| op.matches_failure(key));
        let kind = op.kind();
        state.operations.push(op);
        if fail {
            return Err(HalError::CommandFailed {
                program: kind.to_string(),
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn safety_check(dry_run: bool, confirmed: bool) -> HalResult<()> {
    if !dry_run && !confirmed {
        return Err(HalError::SafetyLock);
    }
    Ok(())
}

impl ProcessOps for FakeHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> HalResult<Output> {
        self.record_operation(Operation::Command {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })?;

        let canned = self.lock().command_outputs.get(program).cloned();
        let (code, stdout) = canned
            .map(|c| (c.code, c.stdout))
            .unwrap_or((0, String::new()));

        Ok(Output {
            // Wait status layout: exit code lives in the second byte.
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.into_bytes(),
            stderr: Vec::new(),
        })
    }
}

impl MountOps for FakeHal {
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: Option<&str>,
        options: MountOptions,
        dry_run: bool,
    ) -> HalResult<()> {
        if dry_run {
            log::info!(
                "FAKE HAL DRY RUN: mount {} -> {}",
                device.display(),
                target.display()
            );
            return Ok(());
        }

        log::info!(
            "FAKE HAL: mount {} -> {} (type: {:?})",
            device.display(),
            target.display(),
            fstype
        );

        self.record_operation(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
            fstype: fstype.map(String::from),
            read_only: options.read_only,
        })?;
        self.lock().mounted_paths.insert(target.to_path_buf());
        Ok(())
    }

    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("FAKE HAL DRY RUN: unmount {}", target.display());
            return Ok(());
        }

        log::info!("FAKE HAL: unmount {}", target.display());

        self.record_operation(Operation::Unmount {
            target: target.to_path_buf(),
        })?;
        self.lock().mounted_paths.remove(target);
        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        Ok(self.lock().mounted_paths.contains(path))
    }
}

impl FormatOps for FakeHal {
    fn format_vfat(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        safety_check(opts.dry_run, opts.confirmed)?;
        if opts.dry_run {
            log::info!(
                "FAKE HAL DRY RUN: mkfs.vfat {} ({})",
                device.display(),
                label
            );
            return Ok(());
        }

        log::info!("FAKE HAL: mkfs.vfat {} ({})", device.display(), label);
        self.record_operation(Operation::FormatVfat {
            device: device.to_path_buf(),
            label: label.to_string(),
        })
    }

    fn format_ntfs(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        safety_check(opts.dry_run, opts.confirmed)?;
        if opts.dry_run {
            log::info!(
                "FAKE HAL DRY RUN: mkfs.ntfs {} ({})",
                device.display(),
                label
            );
            return Ok(());
        }

        log::info!("FAKE HAL: mkfs.ntfs {} ({})", device.display(), label);
        self.record_operation(Operation::FormatNtfs {
            device: device.to_path_buf(),
            label: label.to_string(),
        })
    }
}

impl SystemOps for FakeHal {
    fn sync(&self) -> HalResult<()> {
        self.record_operation(Operation::Sync)
    }

    fn partprobe(&self, disk: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("FAKE HAL DRY RUN: partprobe {}", disk.display());
            return Ok(());
        }
        self.record_operation(Operation::Partprobe {
            disk: disk.to_path_buf(),
        })
    }

    fn power_off(&self, disk: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("FAKE HAL DRY RUN: power-off {}", disk.display());
            return Ok(());
        }
        self.record_operation(Operation::PowerOff {
            disk: disk.to_path_buf(),
        })
    }

    fn is_root(&self) -> bool {
        self.lock().is_root
    }
}

impl ProbeOps for FakeHal {
    fn lsblk_disks(&self) -> HalResult<Vec<BlockDevice>> {
        self.record_operation(Operation::LsblkDisks)?;
        Ok(self.lock().disks.clone())
    }

    fn lsblk_mountpoints(&self, disk: &Path) -> HalResult<Vec<PathBuf>> {
        self.record_operation(Operation::LsblkMountpoints {
            disk: disk.to_path_buf(),
        })?;
        Ok(self
            .lock()
            .disk_mountpoints
            .get(disk)
            .cloned()
            .unwrap_or_default())
    }

    fn is_block_device(&self, path: &Path) -> bool {
        self.lock().block_devices.contains(path)
    }

    fn proc_mountinfo(&self) -> HalResult<String> {
        Ok(self.lock().mountinfo.clone())
    }
}

impl PartitionOps for FakeHal {
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()> {
        safety_check(opts.dry_run, opts.confirmed)?;
        if opts.dry_run {
            log::info!("FAKE HAL DRY RUN: wipefs -a {}", disk.display());
            return Ok(());
        }
        self.record_operation(Operation::WipeFsAll {
            disk: disk.to_path_buf(),
        })
    }

    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<String> {
        safety_check(opts.dry_run, opts.confirmed)?;
        if opts.dry_run {
            log::info!("FAKE HAL DRY RUN: parted {} {:?}", disk.display(), op);
            return Ok(String::new());
        }
        self.record_operation(Operation::Parted {
            disk: disk.to_path_buf(),
            op: format!("{:?}", op),
        })?;

        // Model the partition nodes the kernel would create after a re-read.
        let mut state = self.lock();
        match op {
            PartedOp::MkLabel { .. } => {
                let count = state.partition_counts.remove(disk).unwrap_or(0);
                let disk_str = disk.display().to_string();
                for n in 1..=count {
                    state
                        .block_devices
                        .remove(Path::new(&partition_path(&disk_str, n)));
                }
            }
            PartedOp::MkPart { .. } => {
                let count = state.partition_counts.entry(disk.to_path_buf()).or_insert(0);
                *count += 1;
                let n = *count;
                let node = partition_path(&disk.display().to_string(), n);
                state.block_devices.insert(PathBuf::from(node));
            }
            PartedOp::SetFlag { .. } | PartedOp::Print => {}
        }
        Ok(String::new())
    }
}

impl LoopOps for FakeHal {
    fn losetup_attach(&self, image: &Path, read_only: bool) -> HalResult<String> {
        let loop_device = {
            let mut state = self.lock();
            let dev = format!("/dev/loop{}", state.next_loop);
            state.next_loop += 1;
            dev
        };
        self.record_operation(Operation::LosetupAttach {
            image: image.to_path_buf(),
            read_only,
            loop_device: loop_device.clone(),
        })?;
        Ok(loop_device)
    }

    fn losetup_detach(&self, loop_device: &str) -> HalResult<()> {
        self.record_operation(Operation::LosetupDetach {
            loop_device: loop_device.to_string(),
        })
    }
}

impl RsyncOps for FakeHal {
    fn rsync_stream_stdout(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        on_stdout_line: &mut dyn FnMut(&str) -> bool,
    ) -> HalResult<()> {
        self.record_operation(Operation::Rsync {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            excludes: opts.excludes.clone(),
        })?;

        if opts.dry_run || !self.lock().mirror_copies {
            return Ok(());
        }
        mirror_tree(src, dst, opts, on_stdout_line)
    }
}

/// Whether `rel` (relative to the transfer root) is covered by an rsync-style exclude.
fn is_excluded(rel: &Path, excludes: &[String]) -> bool {
    excludes.iter().any(|pattern| {
        let trimmed = pattern.trim_end_matches('/');
        match trimmed.strip_prefix('/') {
            Some(anchored) => rel.starts_with(anchored),
            None => rel
                .components()
                .any(|c| c.as_os_str() == std::ffi::OsStr::new(trimmed)),
        }
    })
}

fn walk_err(err: walkdir::Error) -> HalError {
    HalError::Io(std::io::Error::other(err.to_string()))
}

/// Local stand-in for `rsync --recursive --delete-before` used when mirroring is enabled.
fn mirror_tree(
    src: &Path,
    dst: &Path,
    opts: &RsyncOptions,
    on_stdout_line: &mut dyn FnMut(&str) -> bool,
) -> HalResult<()> {
    fs::create_dir_all(dst)?;

    if opts.delete_before {
        for entry in WalkDir::new(dst).min_depth(1).contents_first(true) {
            let entry = entry.map_err(walk_err)?;
            let rel = entry.path().strip_prefix(dst).unwrap_or(entry.path());
            // Excluded destination entries are protected from deletion, like rsync without
            // --delete-excluded.
            if is_excluded(rel, &opts.excludes) || src.join(rel).exists() {
                continue;
            }
            if entry.file_type().is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    }

    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let rel = e.path().strip_prefix(src).unwrap_or(e.path());
            !is_excluded(rel, &opts.excludes)
        });
    for entry in walker {
        let entry = entry.map_err(walk_err)?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
        if !on_stdout_line(&rel.display().to_string()) {
            return Err(HalError::Other("rsync cancelled".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_hal_records_mount() {
        let hal = FakeHal::new();
        let device = Path::new("/dev/loop0");
        let target = Path::new("/mnt/winusb/iso");

        hal.mount_device(device, target, Some("udf"), MountOptions::read_only(), false)
            .unwrap();

        assert_eq!(hal.operation_count(), 1);
        assert!(hal.has_operation(|op| matches!(
            op,
            Operation::Mount {
                read_only: true,
                ..
            }
        )));
        assert!(hal.is_mounted(target).unwrap());
    }

    #[test]
    fn fake_hal_records_unmount() {
        let hal = FakeHal::new();
        let target = Path::new("/mnt/winusb/boot");

        hal.mount_device(
            Path::new("/dev/sdb1"),
            target,
            Some("vfat"),
            MountOptions::new(),
            false,
        )
        .unwrap();
        hal.unmount(target, false).unwrap();

        assert_eq!(hal.operation_count(), 2);
        assert!(!hal.is_mounted(target).unwrap());
    }

    #[test]
    fn fake_hal_requires_confirmation() {
        let hal = FakeHal::new();
        let opts = FormatOptions::new(false, false);

        let err = hal
            .format_vfat(Path::new("/dev/sdb1"), "WINBOOT", &opts)
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));

        let err = hal
            .format_ntfs(Path::new("/dev/sdb2"), "WININSTALL", &opts)
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));

        let err = hal
            .wipefs_all(Path::new("/dev/sdb"), &WipeFsOptions::new(false, false))
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn dry_run_records_nothing() {
        let hal = FakeHal::new();
        let disk = Path::new("/dev/sdb");
        hal.wipefs_all(disk, &WipeFsOptions::new(true, false))
            .unwrap();
        hal.parted(
            disk,
            PartedOp::MkLabel {
                label: "gpt".into(),
            },
            &PartedOptions::new(true, false),
        )
        .unwrap();
        hal.format_vfat(
            Path::new("/dev/sdb1"),
            "WINBOOT",
            &FormatOptions::new(true, false),
        )
        .unwrap();
        hal.power_off(disk, true).unwrap();
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn mkpart_creates_partition_nodes_and_mklabel_resets_them() {
        let hal = FakeHal::new();
        let disk = Path::new("/dev/nvme0n1");
        let opts = PartedOptions::new(false, true);
        let mkpart = || PartedOp::MkPart {
            part_type: "primary".into(),
            fs_type: "fat32".into(),
            start: "0%".into(),
            end: "1GiB".into(),
        };

        hal.parted(disk, mkpart(), &opts).unwrap();
        hal.parted(disk, mkpart(), &opts).unwrap();
        assert!(hal.is_block_device(Path::new("/dev/nvme0n1p1")));
        assert!(hal.is_block_device(Path::new("/dev/nvme0n1p2")));

        hal.parted(
            disk,
            PartedOp::MkLabel {
                label: "msdos".into(),
            },
            &opts,
        )
        .unwrap();
        assert!(!hal.is_block_device(Path::new("/dev/nvme0n1p1")));
        assert!(!hal.is_block_device(Path::new("/dev/nvme0n1p2")));
    }

    #[test]
    fn failing_records_then_errors() {
        let hal = FakeHal::new().failing("mount:udf");
        let target = Path::new("/mnt/winusb/iso");

        let err = hal
            .mount_device(
                Path::new("/dev/loop0"),
                target,
                Some("udf"),
                MountOptions::read_only(),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, HalError::CommandFailed { .. }));
        assert!(!hal.is_mounted(target).unwrap());

        hal.mount_device(
            Path::new("/dev/loop0"),
            target,
            Some("iso9660"),
            MountOptions::read_only(),
            false,
        )
        .unwrap();
        assert_eq!(hal.operation_count(), 2);
    }

    #[test]
    fn canned_command_output() {
        let hal = FakeHal::new().with_command_output("wiminfo", 0, "Build:  22631\n");
        let out = hal
            .command_output("wiminfo", &["install.wim", "1"], Duration::from_secs(5))
            .unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout), "Build:  22631\n");

        let hal = FakeHal::new().with_command_output("wiminfo", 2, "");
        let out = hal
            .command_output("wiminfo", &["install.esd", "1"], Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.status.code(), Some(2));
    }

    #[test]
    fn loop_devices_are_numbered() {
        let hal = FakeHal::new();
        let a = hal.losetup_attach(Path::new("/a.iso"), true).unwrap();
        let b = hal.losetup_attach(Path::new("/b.iso"), true).unwrap();
        assert_eq!(a, "/dev/loop0");
        assert_eq!(b, "/dev/loop1");
    }

    #[test]
    fn mirroring_honours_excludes_and_deletes_stale_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("iso");
        let dst = tmp.path().join("boot");
        fs::create_dir_all(src.join("efi/boot")).unwrap();
        fs::create_dir_all(src.join("sources")).unwrap();
        fs::write(src.join("bootmgr"), b"bm").unwrap();
        fs::write(src.join("efi/boot/bootx64.efi"), b"efi").unwrap();
        fs::write(src.join("sources/install.wim"), b"wim").unwrap();

        fs::create_dir_all(dst.join("sources")).unwrap();
        fs::write(dst.join("sources/boot.wim"), b"keep").unwrap();
        fs::write(dst.join("stale.txt"), b"old").unwrap();

        let hal = FakeHal::new().with_mirroring();
        let mut lines = Vec::new();
        hal.rsync_stream_stdout(
            &src,
            &dst,
            &RsyncOptions::mirror().exclude("/sources"),
            &mut |line| {
                lines.push(line.to_string());
                true
            },
        )
        .unwrap();

        assert!(dst.join("bootmgr").is_file());
        assert!(dst.join("efi/boot/bootx64.efi").is_file());
        assert!(!dst.join("sources/install.wim").exists());
        assert!(dst.join("sources/boot.wim").is_file());
        assert!(!dst.join("stale.txt").exists());
        assert!(lines.iter().any(|l| l == "bootmgr"));
    }

    #[test]
    fn unanchored_exclude_matches_any_component() {
        let excludes = vec!["cache".to_string()];
        assert!(is_excluded(Path::new("a/cache/b"), &excludes));
        assert!(!is_excluded(Path::new("a/cached"), &excludes));

        let anchored = vec!["/sources".to_string()];
        assert!(is_excluded(Path::new("sources/boot.wim"), &anchored));
        assert!(!is_excluded(Path::new("x/sources"), &anchored));
    }

    #[test]
    fn fake_hal_can_clear() {
        let hal = FakeHal::new();
        hal.sync().unwrap();
        assert_eq!(hal.operation_count(), 1);
        hal.clear();
        assert_eq!(hal.operation_count(), 0);
    }
}
