use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::config::{Config, NtfsDriver};
use winusb_error::WinUsbError;
use winusb_hal::SystemOps;

/// Tools every run shells out to.
pub const REQUIRED_BINARIES: &[&str] = &[
    "parted",
    "wipefs",
    "mkfs.vfat",
    "mkfs.ntfs",
    "partprobe",
    "rsync",
    "lsblk",
    "losetup",
    "udisksctl",
    "sync",
];

/// Image inspection tool; without it the WIM/ESD version probes are skipped.
pub const WIMINFO: &str = "wiminfo";

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub required_binaries: Vec<String>,
    pub path_env: String,
    /// Require effective UID 0 (dry runs do not).
    pub require_root: bool,
}

impl PreflightConfig {
    pub fn for_config(cfg: &Config, dry_run: bool) -> Self {
        let mut required_binaries: Vec<String> =
            REQUIRED_BINARIES.iter().map(|s| s.to_string()).collect();
        if cfg.ntfs_driver == NtfsDriver::Ntfs3g {
            required_binaries.push(winusb_hal::NTFS_3G.to_string());
        }
        Self {
            required_binaries,
            path_env: std::env::var("PATH").unwrap_or_default(),
            require_root: !dry_run,
        }
    }
}

pub fn run_with(cfg: &PreflightConfig, hal: &dyn SystemOps) -> Result<()> {
    log::info!("🧪 Preflight checks");

    check_binaries(cfg)?;

    if find_executable_in_path(WIMINFO, &cfg.path_env).is_none() {
        log::info!("ℹ️ {} not found; image-based version probes will be skipped", WIMINFO);
    }

    if cfg.require_root && !hal.is_root() {
        return Err(WinUsbError::NotRoot.into());
    }

    log::info!("✅ Preflight complete");
    Ok(())
}

fn check_binaries(cfg: &PreflightConfig) -> Result<()> {
    let missing = missing_binaries(&cfg.required_binaries, &cfg.path_env);
    if !missing.is_empty() {
        return Err(WinUsbError::MissingDependencies(missing).into());
    }
    Ok(())
}

/// Every name in `binaries` that is not an executable file on `path_env`, in input order.
pub fn missing_binaries(binaries: &[String], path_env: &str) -> Vec<String> {
    binaries
        .iter()
        .filter(|bin| find_executable_in_path(bin, path_env).is_none())
        .cloned()
        .collect()
}

pub fn find_executable_in_path(binary: &str, path_env: &str) -> Option<PathBuf> {
    for dir in path_env.split(':').filter(|dir| !dir.is_empty()) {
        let candidate = Path::new(dir).join(binary);
        if let Ok(metadata) = fs::metadata(&candidate) {
            if metadata.is_file() && metadata.permissions().mode() & 0o111 != 0 {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use winusb_hal::FakeHal;

    fn create_exec(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/true").unwrap();
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    fn base_config(tmp: &Path) -> PreflightConfig {
        let bin_dir = tmp.join("bin");
        for bin in REQUIRED_BINARIES {
            create_exec(&bin_dir.join(bin));
        }
        PreflightConfig {
            required_binaries: REQUIRED_BINARIES.iter().map(|s| s.to_string()).collect(),
            path_env: bin_dir.to_string_lossy().to_string(),
            require_root: true,
        }
    }

    #[test]
    fn lists_every_missing_binary() {
        let tmp = tempdir().unwrap();
        let mut cfg = base_config(tmp.path());
        fs::remove_file(tmp.path().join("bin/rsync")).unwrap();
        fs::remove_file(tmp.path().join("bin/mkfs.ntfs")).unwrap();

        let err = run_with(&cfg, &FakeHal::new()).unwrap_err();
        match err.downcast_ref::<WinUsbError>() {
            Some(WinUsbError::MissingDependencies(missing)) => {
                assert_eq!(missing, &["mkfs.ntfs".to_string(), "rsync".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        cfg.required_binaries.clear();
        run_with(&cfg, &FakeHal::new()).unwrap();
    }

    #[test]
    fn non_executable_file_does_not_count() {
        let tmp = tempdir().unwrap();
        let cfg = base_config(tmp.path());
        let path = tmp.path().join("bin/parted");
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).unwrap();

        assert_eq!(
            missing_binaries(&cfg.required_binaries, &cfg.path_env),
            vec!["parted".to_string()]
        );
    }

    #[test]
    fn fails_when_not_root() {
        let tmp = tempdir().unwrap();
        let cfg = base_config(tmp.path());
        let err = run_with(&cfg, &FakeHal::new().with_root(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WinUsbError>(),
            Some(WinUsbError::NotRoot)
        ));
    }

    #[test]
    fn dry_run_does_not_need_root() {
        let tmp = tempdir().unwrap();
        let mut cfg = base_config(tmp.path());
        cfg.require_root = false;
        run_with(&cfg, &FakeHal::new().with_root(false)).unwrap();
    }

    #[test]
    fn ntfs_3g_driver_adds_requirement() {
        let mut config = Config::default();
        config.ntfs_driver = NtfsDriver::Ntfs3g;
        let cfg = PreflightConfig::for_config(&config, false);
        assert!(cfg.required_binaries.iter().any(|b| b == "ntfs-3g"));
        assert!(cfg.require_root);

        let cfg = PreflightConfig::for_config(&Config::default(), true);
        assert!(!cfg.required_binaries.iter().any(|b| b == "ntfs-3g"));
        assert!(!cfg.require_root);
    }
}
