//! Boot mode selection and its partition-table mapping.

use anyhow::Result;
use std::fmt;

use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    /// GPT with an EFI System Partition.
    Uefi,
    /// msdos label with the legacy boot flag.
    Mbr,
}

impl BootMode {
    /// Label passed to `parted mklabel`.
    pub fn table_type(self) -> &'static str {
        match self {
            BootMode::Uefi => "gpt",
            BootMode::Mbr => "msdos",
        }
    }

    /// Flag set on the boot partition.
    pub fn boot_flag(self) -> &'static str {
        match self {
            BootMode::Uefi => "esp",
            BootMode::Mbr => "boot",
        }
    }

    /// Map the operator's menu choice. Anything other than `2` means UEFI.
    pub fn parse_choice(input: &str) -> Self {
        match input.trim() {
            "1" => BootMode::Uefi,
            "2" => BootMode::Mbr,
            other => {
                log::warn!("⚠️ Invalid choice {:?}, defaulting to UEFI (GPT)", other);
                BootMode::Uefi
            }
        }
    }
}

impl fmt::Display for BootMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootMode::Uefi => write!(f, "UEFI (GPT)"),
            BootMode::Mbr => write!(f, "Legacy BIOS (MBR)"),
        }
    }
}

pub fn prompt_for_mode(prompter: &dyn Prompter) -> Result<BootMode> {
    prompter.menu(
        "🥾 Boot mode",
        &[
            "1) UEFI (GPT, recommended)".to_string(),
            "2) Legacy BIOS (MBR)".to_string(),
        ],
    )?;
    let answer = prompter.input("Select boot mode [1-2]")?;
    Ok(BootMode::parse_choice(&answer))
}
