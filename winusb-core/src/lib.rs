//! 💾 winusb core library.
//!
//! `winusb-core` holds the CLI definition, configuration, and the pieces of the
//! ISO-to-USB pipeline (selectors, partitioner, version detector, copier, verifier)
//! composed by [`writer::run`].

pub mod boot_mode;
pub mod cli;
pub mod config;
pub mod copy;
pub mod device;
pub mod errors;
pub mod iso;
pub mod logging;
pub mod partitioning;
pub mod preflight;
pub mod prompt;
pub mod verify;
pub mod version;
pub mod writer;
