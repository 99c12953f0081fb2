use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::config::MountConfig;
use winusb_hal::InstallerHal;

/// The three mount points used by a write run.
#[derive(Debug, Clone)]
pub(super) struct MountPoints {
    pub(super) iso: PathBuf,
    pub(super) boot: PathBuf,
    pub(super) install: PathBuf,
}

impl MountPoints {
    pub(super) fn new(cfg: &MountConfig) -> Self {
        Self {
            iso: cfg.iso.clone(),
            boot: cfg.boot.clone(),
            install: cfg.install.clone(),
        }
    }

    pub(super) fn all(&self) -> [&PathBuf; 3] {
        [&self.iso, &self.boot, &self.install]
    }

    pub(super) fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in self.all() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create mount point: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Unmount anything an interrupted earlier run left behind.
    pub(super) fn release_stale(
        &self,
        hal: &dyn InstallerHal,
        dry_run: bool,
    ) -> anyhow::Result<()> {
        for dir in self.all() {
            if hal.is_mounted(dir).unwrap_or(false) {
                log::warn!("⚠️ {} is still mounted; unmounting", dir.display());
                hal.unmount(dir, dry_run)
                    .with_context(|| format!("Failed to unmount {}", dir.display()))?;
            }
        }
        Ok(())
    }
}
