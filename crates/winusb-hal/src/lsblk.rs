//! Parsing helpers for `lsblk -J` output.

use crate::{HalError, HalResult};
use serde::Deserialize;

/// Columns requested from lsblk when listing candidate disks.
pub const LSBLK_DISK_COLUMNS: &str = "NAME,SIZE,TYPE,MOUNTPOINT,MODEL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mountpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl BlockDevice {
    pub fn disk(name: &str, size: &str) -> Self {
        Self {
            name: name.to_string(),
            size: Some(size.to_string()),
            kind: "disk".to_string(),
            mountpoint: None,
            model: None,
        }
    }

    pub fn is_disk(&self) -> bool {
        self.kind == "disk"
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<BlockDevice>,
}

pub fn parse_lsblk_json(json: &str) -> HalResult<Vec<BlockDevice>> {
    let out: LsblkOutput =
        serde_json::from_str(json).map_err(|e| HalError::Parse(format!("lsblk json: {}", e)))?;
    Ok(out.blockdevices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disks_and_nulls() {
        let json = r#"{
           "blockdevices": [
              {"name":"sda", "size":"465.8G", "type":"disk", "mountpoint":null, "model":"Samsung SSD 860"},
              {"name":"sdb", "size":"28.9G", "type":"disk", "mountpoint":null, "model":"Ultra Fit"},
              {"name":"sr0", "size":"1024M", "type":"rom", "mountpoint":null, "model":null}
           ]
        }"#;
        let devices = parse_lsblk_json(json).unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[1].name, "sdb");
        assert_eq!(devices[1].size.as_deref(), Some("28.9G"));
        assert!(devices[1].is_disk());
        assert!(!devices[2].is_disk());
        assert_eq!(devices[2].model, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_lsblk_json("not json"),
            Err(HalError::Parse(_))
        ));
    }
}
