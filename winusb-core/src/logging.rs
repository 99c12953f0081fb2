use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

static LOGS_TO_FILE: AtomicBool = AtomicBool::new(false);

/// Whether records go to a `--log-file` rather than the terminal.
pub fn logs_to_file() -> bool {
    LOGS_TO_FILE.load(Ordering::Relaxed)
}

/// Initialise `env_logger` at `info` (overridable via `RUST_LOG`).
///
/// With `log_file`, records are appended to that file; if it cannot be opened we fall
/// back to stderr rather than failing the run.
pub fn init_with(log_file: Option<PathBuf>) {
    use env_logger::Target;

    let target = log_file
        .as_deref()
        .and_then(|path| match open_log_file(path) {
            Ok(file) => Some(Target::Pipe(Box::new(file))),
            Err(err) => {
                eprintln!(
                    "⚠️ Cannot open log file {}: {} (logging to stderr)",
                    path.display(),
                    err
                );
                None
            }
        })
        .unwrap_or(Target::Stderr);
    LOGS_TO_FILE.store(matches!(target, Target::Pipe(_)), Ordering::Relaxed);

    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(target)
        .try_init();
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_with_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("var/log/winusb.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn log_file_target_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        init_with(Some(tmp.path().join("winusb.log")));
        assert!(logs_to_file());
    }
}
