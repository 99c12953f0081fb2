use crate::{HalResult, LoopOps, MountOps};
use std::path::{Path, PathBuf};

/// RAII guard that unmounts a target path when dropped.
///
/// The guard may be armed before anything is mounted at `target`: every guard issues exactly
/// one unmount attempt over its lifetime, either through [`MountGuard::unmount`] or on drop.
#[derive(Debug)]
pub struct MountGuard<'a, H: MountOps + ?Sized> {
    hal: &'a H,
    target: PathBuf,
    dry_run: bool,
    active: bool,
}

impl<'a, H: MountOps + ?Sized> MountGuard<'a, H> {
    pub fn new(hal: &'a H, target: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            hal,
            target: target.into(),
            dry_run,
            active: true,
        }
    }

    /// Unmount now and report the result instead of logging it from `Drop`.
    pub fn unmount(mut self) -> HalResult<()> {
        self.active = false;
        self.hal.unmount(&self.target, self.dry_run)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl<'a, H: MountOps + ?Sized> Drop for MountGuard<'a, H> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.hal.unmount(&self.target, self.dry_run) {
            log::warn!(
                "mount guard failed to unmount {}: {}",
                self.target.display(),
                err
            );
        }
    }
}

/// RAII guard that detaches a loop device when dropped.
#[derive(Debug)]
pub struct LoopGuard<'a, H: LoopOps + ?Sized> {
    hal: &'a H,
    loop_device: String,
    active: bool,
}

impl<'a, H: LoopOps + ?Sized> LoopGuard<'a, H> {
    pub fn new(hal: &'a H, loop_device: impl Into<String>) -> Self {
        Self {
            hal,
            loop_device: loop_device.into(),
            active: true,
        }
    }

    pub fn detach(mut self) -> HalResult<()> {
        self.active = false;
        self.hal.losetup_detach(&self.loop_device)
    }

    pub fn device(&self) -> &str {
        &self.loop_device
    }
}

impl<'a, H: LoopOps + ?Sized> Drop for LoopGuard<'a, H> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(err) = self.hal.losetup_detach(&self.loop_device) {
            log::warn!("loop guard failed to detach {}: {}", self.loop_device, err);
        }
    }
}
