//! TOML configuration for winusb.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/winusb/config.toml";

/// FAT32 volume labels are limited to 11 characters.
const MAX_VFAT_LABEL: usize = 11;
/// NTFS volume labels are limited to 32 characters.
const MAX_NTFS_LABEL: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Kernel driver used to mount the NTFS install partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum NtfsDriver {
    #[default]
    #[serde(rename = "ntfs3")]
    Ntfs3,
    #[serde(rename = "ntfs-3g")]
    Ntfs3g,
}

impl NtfsDriver {
    /// Filesystem type handed to the mount HAL.
    pub fn fstype(self) -> &'static str {
        match self {
            NtfsDriver::Ntfs3 => "ntfs3",
            NtfsDriver::Ntfs3g => winusb_hal::NTFS_3G,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MountConfig {
    pub iso: PathBuf,
    pub boot: PathBuf,
    pub install: PathBuf,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            iso: PathBuf::from("/mnt/winusb/iso"),
            boot: PathBuf::from("/mnt/winusb/boot"),
            install: PathBuf::from("/mnt/winusb/install"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Directory scanned for `*.iso` files.
    pub iso_dir: PathBuf,
    pub mounts: MountConfig,
    pub boot_label: String,
    pub install_label: String,
    /// Fixed wait after partitioning before asking the kernel to re-read the table.
    pub settle_delay_secs: u64,
    pub ntfs_driver: NtfsDriver,
}

impl Default for Config {
    fn default() -> Self {
        let sudo_user = std::env::var("SUDO_USER").ok();
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self {
            iso_dir: default_iso_dir(sudo_user.as_deref(), home.as_deref()),
            mounts: MountConfig::default(),
            boot_label: "WINBOOT".to_string(),
            install_label: "WININSTALL".to_string(),
            settle_delay_secs: 3,
            ntfs_driver: NtfsDriver::default(),
        }
    }
}

/// The invoking user's `~/Downloads`: under sudo that is `SUDO_USER`'s home, not root's.
pub fn default_iso_dir(sudo_user: Option<&str>, home: Option<&Path>) -> PathBuf {
    match sudo_user.filter(|u| !u.is_empty() && *u != "root") {
        Some(user) => Path::new("/home").join(user).join("Downloads"),
        None => home
            .unwrap_or_else(|| Path::new("/root"))
            .join("Downloads"),
    }
}

impl Config {
    pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &content)
    }

    /// Load `explicit` when given, else the system config when it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let system = Path::new(DEFAULT_CONFIG_PATH);
        if system.is_file() {
            log::info!("📄 Using config {}", system.display());
            return Self::load_from(system);
        }
        Ok(Self::default())
    }

    pub fn with_iso_dir(mut self, iso_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = iso_dir {
            self.iso_dir = dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_label("boot_label", &self.boot_label, MAX_VFAT_LABEL)?;
        check_label("install_label", &self.install_label, MAX_NTFS_LABEL)?;

        let mounts = [
            &self.mounts.iso,
            &self.mounts.boot,
            &self.mounts.install,
        ];
        for (i, m) in mounts.iter().enumerate() {
            if !m.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "mount point must be absolute: {}",
                    m.display()
                )));
            }
            if mounts[..i].contains(m) {
                return Err(ConfigError::Invalid(format!(
                    "mount points must be distinct: {}",
                    m.display()
                )));
            }
        }
        Ok(())
    }
}

fn check_label(key: &str, label: &str, max: usize) -> Result<(), ConfigError> {
    if label.is_empty() || label.chars().count() > max {
        return Err(ConfigError::Invalid(format!(
            "{} must be 1-{} characters, got {:?}",
            key, max, label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml_str(Path::new("t.toml"), "").unwrap();
        assert_eq!(cfg.mounts, MountConfig::default());
        assert_eq!(cfg.boot_label, "WINBOOT");
        assert_eq!(cfg.install_label, "WININSTALL");
        assert_eq!(cfg.settle_delay_secs, 3);
        assert_eq!(cfg.ntfs_driver, NtfsDriver::Ntfs3);
    }

    #[test]
    fn parses_all_fields() {
        let toml = r#"
            iso_dir = "/srv/isos"
            boot_label = "BOOT"
            install_label = "INSTALL"
            settle_delay_secs = 5
            ntfs_driver = "ntfs-3g"

            [mounts]
            iso = "/run/winusb/iso"
            boot = "/run/winusb/boot"
            install = "/run/winusb/install"
        "#;
        let cfg = Config::from_toml_str(Path::new("t.toml"), toml).unwrap();
        assert_eq!(cfg.iso_dir, PathBuf::from("/srv/isos"));
        assert_eq!(cfg.mounts.boot, PathBuf::from("/run/winusb/boot"));
        assert_eq!(cfg.settle_delay_secs, 5);
        assert_eq!(cfg.ntfs_driver.fstype(), "ntfs-3g");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str(Path::new("t.toml"), "iso_directory = \"/x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn long_vfat_label_is_rejected() {
        let err =
            Config::from_toml_str(Path::new("t.toml"), "boot_label = \"WINDOWSBOOT1\"").unwrap_err();
        assert!(err.to_string().contains("boot_label"));
    }

    #[test]
    fn duplicate_mount_points_are_rejected() {
        let toml = "[mounts]\nboot = \"/mnt/winusb/iso\"\n";
        let err = Config::from_toml_str(Path::new("t.toml"), toml).unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn iso_dir_prefers_sudo_user() {
        assert_eq!(
            default_iso_dir(Some("alice"), Some(Path::new("/root"))),
            PathBuf::from("/home/alice/Downloads")
        );
        assert_eq!(
            default_iso_dir(Some("root"), Some(Path::new("/root"))),
            PathBuf::from("/root/Downloads")
        );
        assert_eq!(
            default_iso_dir(None, Some(Path::new("/home/bob"))),
            PathBuf::from("/home/bob/Downloads")
        );
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn cli_iso_dir_overrides() {
        let cfg = Config::default().with_iso_dir(Some(PathBuf::from("/isos")));
        assert_eq!(cfg.iso_dir, PathBuf::from("/isos"));
    }
}
