//! Windows version detection for a mounted ISO tree.
//!
//! Probes run in a fixed order and the first one that yields a build number wins. Nothing
//! here is fatal: an unreadable or unfamiliar ISO just comes back unresolved.

use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use winusb_hal::ProcessOps;

/// First Windows 11 build (21H2).
pub const WINDOWS_11_MIN_BUILD: u32 = 22000;

const WIMINFO_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolve `rel` under `root`, matching each path component case-insensitively.
///
/// ISO9660/UDF media from Microsoft mix `EFI/Boot` and `efi/boot` across releases.
pub fn resolve_case_insensitive(root: &Path, rel: &str) -> Option<PathBuf> {
    let mut current = root.to_path_buf();
    for component in rel.split('/').filter(|c| !c.is_empty()) {
        let exact = current.join(component);
        if exact.exists() {
            current = exact;
            continue;
        }
        let entry = fs::read_dir(&current)
            .ok()?
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(component))?;
        current = entry.path();
    }
    Some(current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsVersion {
    pub build: Option<u32>,
    /// Name of the probe that produced `build`.
    pub source: Option<&'static str>,
}

impl WindowsVersion {
    pub fn unresolved() -> Self {
        Self {
            build: None,
            source: None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.build {
            Some(b) if b >= WINDOWS_11_MIN_BUILD => "Windows 11",
            Some(_) => "Windows 10",
            None => "Windows 10/11",
        }
    }
}

impl fmt::Display for WindowsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.build, self.source) {
            (Some(b), Some(src)) => write!(f, "{} (build {}, from {})", self.label(), b, src),
            (Some(b), None) => write!(f, "{} (build {})", self.label(), b),
            _ => write!(f, "{} (build unknown)", self.label()),
        }
    }
}

/// One way of finding the build number in an ISO tree.
pub trait BuildProbe {
    fn name(&self) -> &'static str;
    fn probe(&self, iso_root: &Path) -> Option<u32>;
}

/// `sources/idwbinfo.txt`: `BuildString=22621.1.amd64fre...` or `BuildNumber=19041`.
pub struct IdwbInfoProbe;

impl BuildProbe for IdwbInfoProbe {
    fn name(&self) -> &'static str {
        "idwbinfo.txt"
    }

    fn probe(&self, iso_root: &Path) -> Option<u32> {
        let path = resolve_case_insensitive(iso_root, "sources/idwbinfo.txt")?;
        let bytes = fs::read(path).ok()?;
        parse_idwbinfo(&String::from_utf8_lossy(&bytes))
    }
}

pub fn parse_idwbinfo(content: &str) -> Option<u32> {
    let re = Regex::new(r"(?mi)^\s*Build(?:String|Number)\s*=\s*(\d{4,6})").ok()?;
    re.captures(content)?.get(1)?.as_str().parse().ok()
}

/// `wiminfo <image> 1` against an install image (`install.wim` or `install.esd`).
pub struct WimInfoProbe<'a, H: ProcessOps + ?Sized> {
    pub hal: &'a H,
    pub image: &'static str,
    pub name: &'static str,
}

impl<H: ProcessOps + ?Sized> BuildProbe for WimInfoProbe<'_, H> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&self, iso_root: &Path) -> Option<u32> {
        let image = resolve_case_insensitive(iso_root, self.image)?;
        let image = image.to_string_lossy().into_owned();
        let output = self
            .hal
            .command_output("wiminfo", &[image.as_str(), "1"], WIMINFO_TIMEOUT)
            .ok()?;
        if !output.status.success() {
            log::debug!("wiminfo {} exited with {:?}", image, output.status.code());
            return None;
        }
        parse_wiminfo_build(&String::from_utf8_lossy(&output.stdout))
    }
}

pub fn parse_wiminfo_build(stdout: &str) -> Option<u32> {
    let re = Regex::new(r"(?m)^\s*Build:\s*(\d+)").ok()?;
    re.captures(stdout)?.get(1)?.as_str().parse().ok()
}

/// A file that only ships on a given generation of media.
pub struct MarkerProbe {
    pub path: &'static str,
    pub build: u32,
}

impl BuildProbe for MarkerProbe {
    fn name(&self) -> &'static str {
        "marker file"
    }

    fn probe(&self, iso_root: &Path) -> Option<u32> {
        resolve_case_insensitive(iso_root, self.path)
            .filter(|p| p.is_file())
            .map(|_| self.build)
    }
}

/// Embedded `10.0.NNNNN` version strings in `setup.exe` (ASCII or UTF-16LE).
pub struct SetupExeProbe;

impl BuildProbe for SetupExeProbe {
    fn name(&self) -> &'static str {
        "setup.exe"
    }

    fn probe(&self, iso_root: &Path) -> Option<u32> {
        ["setup.exe", "sources/setup.exe"]
            .iter()
            .filter_map(|rel| resolve_case_insensitive(iso_root, rel))
            .filter_map(|path| fs::read(path).ok())
            .find_map(|bytes| scan_version_strings(&bytes))
    }
}

/// Highest `10.0.NNNNN` build embedded in `bytes`.
pub fn scan_version_strings(bytes: &[u8]) -> Option<u32> {
    let ascii = BytesRegex::new(r"10\.0\.(\d{5})").ok()?;
    let wide = BytesRegex::new(r"(?-u)1\x000\x00\.\x000\x00\.\x00((?:[0-9]\x00){5})").ok()?;

    let from_ascii = ascii
        .captures_iter(bytes)
        .filter_map(|c| c.get(1))
        .filter_map(|m| std::str::from_utf8(m.as_bytes()).ok()?.parse::<u32>().ok());
    let from_wide = wide.captures_iter(bytes).filter_map(|c| c.get(1)).filter_map(|m| {
        let digits: String = m.as_bytes().iter().step_by(2).map(|b| *b as char).collect();
        digits.parse::<u32>().ok()
    });

    from_ascii.chain(from_wide).max()
}

/// Probes in precedence order. The WIM/ESD probes need `wiminfo` on PATH.
pub fn default_probes<'a, H: ProcessOps + ?Sized>(
    hal: &'a H,
    wiminfo_available: bool,
) -> Vec<Box<dyn BuildProbe + 'a>> {
    let mut probes: Vec<Box<dyn BuildProbe + 'a>> = vec![Box::new(IdwbInfoProbe)];
    if wiminfo_available {
        probes.push(Box::new(WimInfoProbe {
            hal,
            image: "sources/install.wim",
            name: "install.wim",
        }));
        probes.push(Box::new(WimInfoProbe {
            hal,
            image: "sources/install.esd",
            name: "install.esd",
        }));
    }
    probes.push(Box::new(MarkerProbe {
        path: "efi/microsoft/boot/efisys_ex.bin",
        build: WINDOWS_11_MIN_BUILD,
    }));
    probes.push(Box::new(SetupExeProbe));
    probes
}

pub fn detect_with(iso_root: &Path, probes: &[Box<dyn BuildProbe + '_>]) -> WindowsVersion {
    for probe in probes {
        match probe.probe(iso_root) {
            Some(build) => {
                log::debug!("probe {} found build {}", probe.name(), build);
                return WindowsVersion {
                    build: Some(build),
                    source: Some(probe.name()),
                };
            }
            None => log::debug!("probe {} found nothing", probe.name()),
        }
    }
    WindowsVersion::unresolved()
}

pub fn detect_version<H: ProcessOps + ?Sized>(
    iso_root: &Path,
    hal: &H,
    wiminfo_available: bool,
) -> WindowsVersion {
    let probes = default_probes(hal, wiminfo_available);
    let version = detect_with(iso_root, &probes);
    log::info!("🪟 Detected {}", version);
    version
}
