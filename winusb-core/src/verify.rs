//! Post-copy check of the boot partition.

use anyhow::Result;
use std::path::Path;

use crate::boot_mode::BootMode;
use crate::copy::BOOT_WIM;
use crate::prompt::Prompter;
use crate::version::resolve_case_insensitive;
use winusb_error::WinUsbError;

/// Files firmware or Windows Setup need on the boot partition for `mode`.
pub fn required_artifacts(mode: BootMode) -> Vec<&'static str> {
    let loader = match mode {
        BootMode::Uefi => "efi/boot/bootx64.efi",
        BootMode::Mbr => "bootmgr",
    };
    vec![loader, BOOT_WIM]
}

pub fn missing_artifacts(boot_root: &Path, mode: BootMode) -> Vec<&'static str> {
    required_artifacts(mode)
        .into_iter()
        .filter(|rel| resolve_case_insensitive(boot_root, rel).is_none())
        .collect()
}

/// Warn about missing artifacts and let the operator decide.
///
/// Path casing and layout drift between Windows releases, so a miss here is not proof the
/// stick is unbootable. `assume_yes` continues without asking.
pub fn verify_boot_files(
    boot_root: &Path,
    mode: BootMode,
    assume_yes: bool,
    prompter: &dyn Prompter,
) -> Result<()> {
    let missing = missing_artifacts(boot_root, mode);
    if missing.is_empty() {
        log::info!("✅ Boot files present for {}", mode);
        return Ok(());
    }

    for rel in &missing {
        log::warn!("⚠️ Missing on boot partition: {}", rel);
    }
    if assume_yes {
        log::warn!("⚠️ Continuing (--yes)");
        return Ok(());
    }
    if prompter.confirm("Boot files are missing. Continue anyway?", false)? {
        Ok(())
    } else {
        Err(WinUsbError::Aborted.into())
    }
}
