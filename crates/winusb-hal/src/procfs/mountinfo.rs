//! Parsing helpers for `/proc/self/mountinfo`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub mount_point: PathBuf,
    pub source: String,
}

/// Parse mountinfo lines of the form
/// `<id> <parent> <maj:min> <root> <mount point> <opts...> - <fstype> <source> <superopts>`.
pub fn parse_mountinfo(content: &str) -> Vec<MountInfo> {
    content
        .lines()
        .filter_map(|line| {
            let (pre, post) = line.split_once(" - ")?;
            let mount_point = pre.split_whitespace().nth(4)?;
            let source = post.split_whitespace().nth(1)?;
            Some(MountInfo {
                mount_point: PathBuf::from(unescape_mount_path(mount_point)),
                source: source.to_string(),
            })
        })
        .collect()
}

pub fn is_mounted_from_info(path: &Path, entries: &[MountInfo]) -> bool {
    let target = normalize_path(path);
    entries
        .iter()
        .any(|entry| normalize_path(&entry.mount_point) == target)
}

pub fn root_mount_source(mountinfo: &str) -> Option<String> {
    parse_mountinfo(mountinfo)
        .into_iter()
        .find(|entry| entry.mount_point == Path::new("/"))
        .map(|entry| entry.source)
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.len() > 1 && s.ends_with('/') {
        s.trim_end_matches('/').to_string()
    } else {
        s.to_string()
    }
}
