use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Safety lock engaged. Confirm the target device before destructive operations.")]
    SafetyLock,

    #[error("Disk is busy (mounted or in use)")]
    DiskBusy,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {program} (exit={code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out: {program} after {timeout_secs}s")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("nix errno: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum WinUsbError {
    #[error(transparent)]
    Hal(#[from] HalError),

    #[error("Missing required tools: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    #[error("This operation must be run as root (try: sudo winusb)")]
    NotRoot,

    #[error("No ISO files found in {}", .0.display())]
    NoIsoFound(PathBuf),

    #[error("Invalid ISO selection: {0}")]
    InvalidIsoSelection(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Partitioning failed: {0}")]
    PartitioningFailed(String),

    #[error("Partitions missing after partprobe: {}", .0.join(", "))]
    PartitionsMissing(Vec<String>),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Operation aborted by user")]
    Aborted,

    #[error("Cancelled")]
    Cancelled,
}
