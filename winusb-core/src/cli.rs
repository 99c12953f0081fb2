//! CLI argument parsing for winusb
//!
//! Writing a USB stick is the default when no subcommand is provided.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::boot_mode::BootMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// GPT partition table with an EFI System Partition
    Uefi,
    /// MBR (msdos) partition table with the boot flag (legacy BIOS)
    Mbr,
}

impl From<ModeArg> for BootMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Uefi => BootMode::Uefi,
            ModeArg::Mbr => BootMode::Mbr,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "winusb")]
#[command(about = "💾 winusb - bootable Windows installer USB from an ISO")]
#[command(long_about = "💾 winusb - bootable Windows installer USB from an ISO\n\n\
    Partitions a USB stick (FAT32 boot + NTFS install), copies the ISO contents onto it\n\
    and verifies the boot files. Run as root.\n\n\
    Run without a subcommand to start the interactive writer.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a TOML config file (default: /etc/winusb/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in dry-run mode (no changes made)
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Directory scanned for *.iso files (overrides the config file)
    #[arg(long, global = true)]
    pub iso_dir: Option<PathBuf>,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WriteArgs {
    /// ISO file to write (skips the ISO prompt)
    #[arg(long)]
    pub iso: Option<PathBuf>,

    /// Boot mode (skips the boot mode prompt)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Target device name, e.g. sdb or /dev/sdb (skips the device prompt)
    #[arg(long)]
    pub device: Option<String>,

    /// Do not pause before wiping and continue past verification warnings
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 💾 Write an ISO to a USB device (default)
    Write(WriteArgs),

    /// 🔍 Run preflight checks (required tools, root)
    Preflight,

    /// 🪟 Detect the Windows version of an extracted or mounted ISO tree
    Detect {
        /// Root directory of the ISO contents
        iso_root: PathBuf,
    },
}
