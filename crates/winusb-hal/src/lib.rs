//! winusb Hardware Abstraction Layer (HAL).
//!
//! Everything that touches the outside world (block devices, mounts, external tools) goes
//! through the traits in [`hal`], so the provisioning workflow can run against [`FakeHal`]
//! in tests without root or real hardware.

pub mod hal;
pub mod lsblk;
pub mod path;
pub mod procfs;

pub use hal::*;
pub use lsblk::BlockDevice;
pub use winusb_error::{HalError, HalResult};
