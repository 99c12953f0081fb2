//! Writer module - the ISO-to-USB pipeline

mod cancel;
mod config;
mod mounts;
mod runner;

pub(crate) use cancel::cancel_requested;
pub use cancel::{clear_cancel_flag, set_cancel_flag};
pub use config::{WriterConfig, WriterContext};
pub use runner::{detect_only, run};
