//! Input validation guard rails for command-line selections.

use std::path::Path;
use winusb_core::device::normalize_device_name;

pub fn validate_device_name(device: &str) -> Result<(), String> {
    normalize_device_name(device)
        .map(|_| ())
        .map_err(|err| format!("{} (expected e.g. sdb or /dev/sdb)", err))
}

pub fn validate_iso_path(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() {
        return Err("ISO path is required.".to_string());
    }
    if !path.exists() {
        return Err(format!("ISO file not found: {}", path.display()));
    }
    if !path.is_file() {
        return Err(format!("ISO path is not a file: {}", path.display()));
    }
    Ok(())
}
