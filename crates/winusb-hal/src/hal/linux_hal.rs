//! Linux HAL implementation using real system calls and tools.

use super::mount_ops::NTFS_3G;
use super::{
    parted_args, rsync_args, FormatOps, FormatOptions, LoopOps, MountOps, MountOptions, PartedOp,
    PartedOptions, PartitionOps, ProbeOps, ProcessOps, RsyncOps, RsyncOptions, SystemOps,
    WipeFsOptions,
};
use crate::lsblk::{parse_lsblk_json, LSBLK_DISK_COLUMNS};
use crate::{BlockDevice, HalError, HalResult};
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

// Formatting, copying and sync run to completion however long the medium takes; only quick
// probes are bounded.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const WIPEFS_TIMEOUT: Duration = Duration::from_secs(60);
const PARTED_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const PARTPROBE_TIMEOUT: Duration = Duration::from_secs(60);
const LOSETUP_TIMEOUT: Duration = Duration::from_secs(30);
const POWER_OFF_TIMEOUT: Duration = Duration::from_secs(60);

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

fn output_with_timeout(
    program: &str,
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> HalResult<Output> {
    // Avoid commands hanging waiting for input.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match timeout {
        None => child.wait().map_err(HalError::Io)?,
        Some(limit) => match child.wait_timeout(limit).map_err(HalError::Io)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(HalError::CommandTimeout {
                    program: program.to_string(),
                    timeout_secs: limit.as_secs(),
                });
            }
        },
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

fn status_with_timeout(
    program: &str,
    cmd: &mut Command,
    timeout: Option<Duration>,
) -> HalResult<Output> {
    let output = output_with_timeout(program, cmd, timeout)?;
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(output)
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::DiskBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<Output> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        output_with_timeout(program, &mut cmd, Some(timeout))
    }
}

impl MountOps for LinuxHal {
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
                "DRY RUN: mount {} -> {} ({})",
                device.display(),
                target.display(),
                fstype.unwrap_or("auto")
            );
            return Ok(());
        }

        if fstype == Some(NTFS_3G) {
            // FUSE driver: mount(2) cannot do this, the helper binary has to.
            let mut cmd = Command::new(NTFS_3G);
            if let Some(opts) = options.options.as_deref() {
                cmd.args(["-o", opts]);
            }
            if options.read_only {
                cmd.args(["-o", "ro"]);
            }
            cmd.arg(device).arg(target);
            status_with_timeout(NTFS_3G, &mut cmd, Some(PROBE_TIMEOUT))?;
            return Ok(());
        }

        let mut flags = nix::mount::MsFlags::empty();
        if options.read_only {
            flags |= nix::mount::MsFlags::MS_RDONLY;
        }
        let data = options.options.as_deref();

        nix::mount::mount(Some(device), target, fstype, flags, data).map_err(map_nix_err)?;

        Ok(())
    }

    fn unmount(&self, target: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: unmount {}", target.display());
            return Ok(());
        }

        nix::mount::umount2(target, nix::mount::MntFlags::empty()).map_err(map_nix_err)?;

        Ok(())
    }

    fn is_mounted(&self, path: &Path) -> HalResult<bool> {
        let content = fs::read_to_string("/proc/self/mountinfo")?;
        let entries = crate::procfs::mountinfo::parse_mountinfo(&content);
        Ok(crate::procfs::mountinfo::is_mounted_from_info(
            path, &entries,
        ))
    }
}

impl FormatOps for LinuxHal {
    fn format_vfat(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if opts.dry_run {
            log::info!("DRY RUN: mkfs.vfat -F 32 {} ({})", device.display(), label);
            return Ok(());
        }

        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }

        let mut args: Vec<String> = vec!["-F".to_string(), "32".to_string()];
        args.push("-n".to_string());
        args.push(label.to_string());
        args.extend(opts.extra_args.iter().cloned());
        args.push(device.display().to_string());

        let mut cmd = Command::new("mkfs.vfat");
        cmd.args(&args);
        status_with_timeout("mkfs.vfat", &mut cmd, None)?;
        Ok(())
    }

    fn format_ntfs(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if opts.dry_run {
            log::info!("DRY RUN: mkfs.ntfs -f {} ({})", device.display(), label);
            return Ok(());
        }

        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }

        // -f: quick format; zeroing a whole USB stick takes ages and buys nothing here.
        let mut args: Vec<String> = vec!["-f".to_string(), "-L".to_string(), label.to_string()];
        args.extend(opts.extra_args.iter().cloned());
        args.push(device.display().to_string());

        let mut cmd = Command::new("mkfs.ntfs");
        cmd.args(&args);
        status_with_timeout("mkfs.ntfs", &mut cmd, None)?;
        Ok(())
    }
}

impl SystemOps for LinuxHal {
    fn sync(&self) -> HalResult<()> {
        let mut cmd = Command::new("sync");
        status_with_timeout("sync", &mut cmd, None)?;
        Ok(())
    }

    fn partprobe(&self, disk: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: partprobe {}", disk.display());
            return Ok(());
        }
        let mut cmd = Command::new("partprobe");
        cmd.arg(disk);
        status_with_timeout("partprobe", &mut cmd, Some(PARTPROBE_TIMEOUT))?;
        Ok(())
    }

    fn power_off(&self, disk: &Path, dry_run: bool) -> HalResult<()> {
        if dry_run {
            log::info!("DRY RUN: udisksctl power-off -b {}", disk.display());
            return Ok(());
        }
        let mut cmd = Command::new("udisksctl");
        cmd.args(["power-off", "-b"]).arg(disk);
        status_with_timeout("udisksctl", &mut cmd, Some(POWER_OFF_TIMEOUT))?;
        Ok(())
    }

    fn is_root(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }
}

impl ProbeOps for LinuxHal {
    fn lsblk_disks(&self) -> HalResult<Vec<BlockDevice>> {
        let mut cmd = Command::new("lsblk");
        cmd.args(["-J", "-d", "-o", LSBLK_DISK_COLUMNS]);
        let output = status_with_timeout("lsblk", &mut cmd, Some(PROBE_TIMEOUT))?;
        parse_lsblk_json(&String::from_utf8(output.stdout)?)
    }

    fn lsblk_mountpoints(&self, disk: &Path) -> HalResult<Vec<PathBuf>> {
        let mut cmd = Command::new("lsblk");
        cmd.args(["-lnpo", "MOUNTPOINT"]).arg(disk);
        let output = status_with_timeout("lsblk", &mut cmd, Some(PROBE_TIMEOUT))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn is_block_device(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.file_type().is_block_device())
            .unwrap_or(false)
    }

    fn proc_mountinfo(&self) -> HalResult<String> {
        Ok(fs::read_to_string("/proc/self/mountinfo")?)
    }
}

impl PartitionOps for LinuxHal {
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()> {
        if opts.dry_run {
            log::info!("DRY RUN: wipefs -a {}", disk.display());
            return Ok(());
        }
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }

        let mut cmd = Command::new("wipefs");
        cmd.args(["-a"]).arg(disk);
        status_with_timeout("wipefs", &mut cmd, Some(WIPEFS_TIMEOUT))?;
        Ok(())
    }

    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<String> {
        if opts.dry_run {
            log::info!("DRY RUN: parted {}", parted_args(disk, &op).join(" "));
            return Ok(String::new());
        }
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }

        let mut cmd = Command::new("parted");
        cmd.args(parted_args(disk, &op));
        let output = status_with_timeout("parted", &mut cmd, Some(PARTED_TIMEOUT))?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl LoopOps for LinuxHal {
    fn losetup_attach(&self, image: &Path, read_only: bool) -> HalResult<String> {
        let mut args = vec!["--show".to_string(), "-f".to_string()];
        if read_only {
            args.push("-r".to_string());
        }
        args.push(image.display().to_string());

        let mut cmd = Command::new("losetup");
        cmd.args(&args);
        let output = status_with_timeout("losetup", &mut cmd, Some(LOSETUP_TIMEOUT))?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn losetup_detach(&self, loop_device: &str) -> HalResult<()> {
        let mut cmd = Command::new("losetup");
        cmd.args(["-d", loop_device]);
        status_with_timeout("losetup", &mut cmd, Some(LOSETUP_TIMEOUT))?;
        Ok(())
    }
}

impl RsyncOps for LinuxHal {
    fn rsync_stream_stdout(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        on_stdout_line: &mut dyn FnMut(&str) -> bool,
    ) -> HalResult<()> {
        let args = rsync_args(src, dst, opts);

        let mut child = Command::new("rsync")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| map_command_err("rsync", e))?;

        // Drain stderr in the background to avoid deadlocks if rsync is chatty.
        let stderr_handle = child.stderr.take().map(|stderr| {
            std::thread::spawn(move || {
                let mut s = String::new();
                let mut reader = BufReader::new(stderr);
                let _ = reader.read_to_string(&mut s);
                s
            })
        });

        if let Some(stdout) = child.stdout.take() {
            // `--progress` rewrites its status line with '\r'; treat that as a line break too.
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let read = reader.read_until(b'\n', &mut buf)?;
                if read == 0 {
                    break;
                }
                let text = String::from_utf8_lossy(&buf);
                for line in text.split(['\r', '\n']).filter(|l| !l.trim().is_empty()) {
                    if !on_stdout_line(line) {
                        let _ = child.kill();
                        let _ = child.wait();
                        if let Some(h) = stderr_handle {
                            let _ = h.join();
                        }
                        return Err(HalError::Other("rsync cancelled".to_string()));
                    }
                }
            }
        }

        let status = child.wait()?;
        let stderr_s = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(HalError::CommandFailed {
                program: "rsync".to_string(),
                code: status.code(),
                stderr: stderr_s.trim().to_string(),
            });
        }
        Ok(())
    }
}
