//! Process execution helpers.
//!
//! External commands are considered "world-touching" and must go through the HAL so we can
//! test workflows without spawning real processes.

use crate::HalResult;
use std::process::Output;
use std::time::Duration;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run `program` and capture its output. Non-zero exit is *not* an error here; callers
    /// inspect `Output::status` themselves.
    fn command_output(&self, program: &str, args: &[&str], timeout: Duration)
        -> HalResult<Output>;
}
