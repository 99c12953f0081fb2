//! Yes/no prompts.

use anyhow::{Context, Result};
use dialoguer::Confirm;

pub fn confirm_action(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .context("Failed to read confirmation input")
}
