//! dialoguer-backed [`Prompter`].

use anyhow::{Context, Result};
use dialoguer::Input;
use winusb_core::prompt::Prompter;

use super::confirm::confirm_action;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn menu(&self, title: &str, items: &[String]) -> Result<()> {
        eprintln!("{}:", title);
        for item in items {
            eprintln!("  {}", item);
        }
        Ok(())
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        confirm_action(prompt, default)
    }

    fn pause(&self, prompt: &str) -> Result<()> {
        self.input(prompt).map(|_| ())
    }
}
