//! Mirroring copy operations (rsync).

use crate::HalResult;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct RsyncOptions {
    pub recursive: bool,
    /// Delete destination entries missing from the source before transferring (`--delete-before`).
    pub delete_before: bool,
    /// Emit per-file progress (`--progress`).
    pub progress: bool,
    /// `--exclude` patterns, passed verbatim. A leading `/` anchors the pattern at the source root.
    pub excludes: Vec<String>,
    pub dry_run: bool,
    /// Extra rsync args (verbatim).
    pub extra_args: Vec<String>,
}

impl RsyncOptions {
    /// Exact replica of the source tree, with per-file progress.
    ///
    /// Ownership and permissions are not carried over: neither FAT32 nor NTFS (as mounted here)
    /// can represent them, and the ISO tree is read-only anyway.
    pub fn mirror() -> Self {
        Self {
            recursive: true,
            delete_before: true,
            progress: true,
            excludes: Vec::new(),
            dry_run: false,
            extra_args: Vec::new(),
        }
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Build the rsync argument vector. The source always gets a trailing slash so that its
/// *contents* land in `dst`.
pub fn rsync_args(src: &Path, dst: &Path, opts: &RsyncOptions) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if opts.recursive {
        args.push("--recursive".to_string());
    }
    if opts.delete_before {
        args.push("--delete-before".to_string());
    }
    if opts.progress {
        args.push("--progress".to_string());
    }
    if opts.dry_run {
        args.push("--dry-run".to_string());
    }
    for pattern in &opts.excludes {
        args.push(format!("--exclude={}", pattern));
    }
    args.extend(opts.extra_args.iter().cloned());

    let src_str = src.display().to_string();
    if src_str.ends_with('/') {
        args.push(src_str);
    } else {
        args.push(format!("{}/", src_str));
    }
    args.push(dst.display().to_string());
    args
}

pub trait RsyncOps {
    /// Run rsync, streaming stdout line-by-line into `on_stdout_line`.
    ///
    /// Return an error if rsync fails. If `on_stdout_line` returns false, rsync is aborted and
    /// the call returns an error.
    fn rsync_stream_stdout(
        &self,
        src: &Path,
        dst: &Path,
        opts: &RsyncOptions,
        on_stdout_line: &mut dyn FnMut(&str) -> bool,
    ) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_args_with_anchored_exclude() {
        let opts = RsyncOptions::mirror().exclude("/sources");
        let args = rsync_args(Path::new("/mnt/iso"), Path::new("/mnt/boot"), &opts);
        assert_eq!(
            args,
            [
                "--recursive",
                "--delete-before",
                "--progress",
                "--exclude=/sources",
                "/mnt/iso/",
                "/mnt/boot"
            ]
        );
    }

    #[test]
    fn source_slash_not_doubled() {
        let args = rsync_args(
            Path::new("/mnt/iso/"),
            Path::new("/mnt/install"),
            &RsyncOptions::mirror().dry_run(true),
        );
        assert!(args.contains(&"--dry-run".to_string()));
        assert_eq!(args[args.len() - 2], "/mnt/iso/");
    }
}
