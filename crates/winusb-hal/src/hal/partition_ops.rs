//! Partitioning operations (wipefs/parted).

use crate::HalResult;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct WipeFsOptions {
    pub dry_run: bool,
    pub confirmed: bool,
}

impl WipeFsOptions {
    pub fn new(dry_run: bool, confirmed: bool) -> Self {
        Self { dry_run, confirmed }
    }
}

#[derive(Debug, Clone)]
pub struct PartedOptions {
    pub dry_run: bool,
    pub confirmed: bool,
}

impl PartedOptions {
    pub fn new(dry_run: bool, confirmed: bool) -> Self {
        Self { dry_run, confirmed }
    }
}

/// A single partition operation executed via `parted -s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartedOp {
    MkLabel {
        label: String,
    },
    MkPart {
        part_type: String,
        fs_type: String,
        start: String,
        end: String,
    },
    SetFlag {
        part_num: u32,
        flag: String,
        state: String,
    },
    Print,
}

/// Build the argument vector for `parted` (without the program name).
pub fn parted_args(disk: &Path, op: &PartedOp) -> Vec<String> {
    let mut args: Vec<String> = vec!["-s".to_string(), disk.display().to_string()];
    match op {
        PartedOp::MkLabel { label } => {
            args.push("mklabel".to_string());
            args.push(label.clone());
        }
        PartedOp::MkPart {
            part_type,
            fs_type,
            start,
            end,
        } => {
            args.extend(["-a", "optimal", "mkpart"].map(String::from));
            args.push(part_type.clone());
            args.push(fs_type.clone());
            args.push(start.clone());
            args.push(end.clone());
        }
        PartedOp::SetFlag {
            part_num,
            flag,
            state,
        } => {
            args.push("set".to_string());
            args.push(part_num.to_string());
            args.push(flag.clone());
            args.push(state.clone());
        }
        PartedOp::Print => args.push("print".to_string()),
    }
    args
}

pub trait PartitionOps {
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()>;

    /// Execute a single `parted` operation on the given disk.
    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<String>;
}
