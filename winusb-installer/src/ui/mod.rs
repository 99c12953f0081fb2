//! Terminal UI helpers for the CLI flow.

use std::io::IsTerminal;

use winusb_core::writer::WriterConfig;

pub mod cancel;
pub mod confirm;
pub mod prompt;
pub mod style;
pub mod validation;

/// Whether a run with `cfg` will stop to ask the operator anything.
pub fn needs_prompts(cfg: &WriterConfig) -> bool {
    cfg.iso.is_none() || cfg.mode.is_none() || cfg.device.is_none() || !cfg.assume_yes
}

pub fn ensure_interactive_terminal() -> anyhow::Result<()> {
    if std::io::stdin().is_terminal() {
        return Ok(());
    }

    anyhow::bail!(
        "No TTY detected. The writer prompts for input.\n\
         Run it in a terminal, or pass --iso, --mode, --device and --yes."
    );
}
