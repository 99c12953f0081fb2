use super::cancel::cancel_requested;
use anyhow::Result;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::boot_mode::BootMode;
use crate::cli::WriteArgs;
use crate::config::Config;
use winusb_error::WinUsbError;
use winusb_hal::InstallerHal;

/// Everything a write run needs, resolved from CLI flags and the config file.
///
/// Selections left as `None` are asked for interactively.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub config: Config,
    pub iso: Option<PathBuf>,
    pub mode: Option<BootMode>,
    pub device: Option<String>,
    /// Skip the press-Enter gate and continue past verification warnings.
    pub assume_yes: bool,
    pub dry_run: bool,
    /// `wiminfo` was found on `PATH`; enables the WIM/ESD version probes.
    pub wiminfo_available: bool,
}

impl WriterConfig {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            iso: None,
            mode: None,
            device: None,
            assume_yes: false,
            dry_run: false,
            wiminfo_available: false,
        }
    }

    pub fn from_args(config: Config, args: &WriteArgs, dry_run: bool) -> Self {
        Self {
            iso: args.iso.clone(),
            mode: args.mode.map(BootMode::from),
            device: args.device.clone(),
            assume_yes: args.yes,
            dry_run,
            ..Self::new(config)
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.config.settle_delay_secs)
    }
}

/// Per-run state threaded through the pipeline steps.
pub struct WriterContext<'a> {
    pub hal: &'a dyn InstallerHal,
    pub dry_run: bool,
    /// Set once the operator has passed the destructive-action gate.
    pub confirmed: bool,
}

impl<'a> WriterContext<'a> {
    pub(super) fn check_cancel(&self) -> Result<()> {
        if cancel_requested() {
            self.status("🧹 Cleaning up...");
            return Err(WinUsbError::Cancelled.into());
        }
        Ok(())
    }

    pub(super) fn status(&self, msg: &str) {
        info!("{}", msg);
    }
}
