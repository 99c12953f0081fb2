//! Operator interaction seam.
//!
//! The pipeline never reads stdin directly; the binary supplies a terminal prompter and
//! tests supply [`ScriptedPrompter`].

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

pub trait Prompter {
    /// Show a titled list the next prompt refers to (ISO index, boot modes, disks).
    fn menu(&self, title: &str, items: &[String]) -> Result<()>;

    /// Ask for a line of free-form input.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Wait for the operator to press Enter.
    fn pause(&self, prompt: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Input(String),
    Confirm(bool),
    Enter,
}

/// Replays a fixed list of answers in order; any mismatch or exhaustion is an error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
    menus: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
            menus: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Menus shown so far, as `(title, items)`.
    pub fn menus(&self) -> Vec<(String, Vec<String>)> {
        self.menus
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(prompt.to_string());
        }
        self.answers
            .lock()
            .map_err(|_| anyhow!("prompter state poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for prompt: {}", prompt))
    }
}

impl Prompter for ScriptedPrompter {
    fn menu(&self, title: &str, items: &[String]) -> Result<()> {
        if let Ok(mut menus) = self.menus.lock() {
            menus.push((title.to_string(), items.to_vec()));
        }
        Ok(())
    }

    fn input(&self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            Answer::Input(s) => Ok(s),
            other => Err(anyhow!("expected input for {:?}, got {:?}", prompt, other)),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(b) => Ok(b),
            other => Err(anyhow!(
                "expected confirmation for {:?}, got {:?}",
                prompt,
                other
            )),
        }
    }

    fn pause(&self, prompt: &str) -> Result<()> {
        match self.next(prompt)? {
            Answer::Enter => Ok(()),
            other => Err(anyhow!("expected Enter for {:?}, got {:?}", prompt, other)),
        }
    }
}
