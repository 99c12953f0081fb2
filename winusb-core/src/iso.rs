//! ISO discovery and selection.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::prompt::Prompter;
use winusb_error::WinUsbError;

/// Regular files directly inside `dir` whose name ends in `.iso` (any case), sorted.
pub fn find_iso_candidates(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(WinUsbError::NoIsoFound(dir.to_path_buf()).into());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_iso = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("iso"));
        if is_iso {
            found.push(entry.into_path());
        }
    }
    found.sort();

    if found.is_empty() {
        return Err(WinUsbError::NoIsoFound(dir.to_path_buf()).into());
    }
    Ok(found)
}

/// Resolve a 1-based selection against `candidates`.
pub fn select_iso(candidates: &[PathBuf], input: &str) -> Result<PathBuf> {
    let trimmed = input.trim();
    let index: usize = trimmed
        .parse()
        .map_err(|_| WinUsbError::InvalidIsoSelection(format!("not a number: {:?}", trimmed)))?;
    if index == 0 || index > candidates.len() {
        return Err(WinUsbError::InvalidIsoSelection(format!(
            "{} is out of range 1-{}",
            index,
            candidates.len()
        ))
        .into());
    }
    let chosen = &candidates[index - 1];
    fs::canonicalize(chosen).with_context(|| format!("Failed to resolve {}", chosen.display()))
}

/// `--iso` bypass: the path must name an existing regular file.
pub fn resolve_explicit_iso(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(WinUsbError::InvalidIsoSelection(format!(
            "not a file: {}",
            path.display()
        ))
        .into());
    }
    fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))
}

pub fn prompt_for_iso(dir: &Path, prompter: &dyn Prompter) -> Result<PathBuf> {
    let candidates = find_iso_candidates(dir)?;
    let items: Vec<String> = candidates
        .iter()
        .enumerate()
        .map(|(i, iso)| {
            let name = iso.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            format!("{}) {}", i + 1, name)
        })
        .collect();
    prompter.menu(&format!("📀 ISO files in {}", dir.display()), &items)?;
    let answer = prompter.input(&format!("Select ISO [1-{}]", candidates.len()))?;
    select_iso(&candidates, &answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{Answer, ScriptedPrompter};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn lists_iso_files_case_insensitively_and_sorted() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("b_Win10.ISO"));
        touch(&tmp.path().join("a_Win11.iso"));
        touch(&tmp.path().join("notes.txt"));
        fs::create_dir(tmp.path().join("dir.iso")).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        touch(&tmp.path().join("nested/deep.iso"));

        let found = find_iso_candidates(tmp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_Win11.iso", "b_Win10.ISO"]);
    }

    #[test]
    fn empty_dir_is_fatal() {
        let tmp = tempdir().unwrap();
        let err = find_iso_candidates(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WinUsbError>(),
            Some(WinUsbError::NoIsoFound(_))
        ));
    }

    #[test]
    fn selection_rejects_bad_input() {
        let tmp = tempdir().unwrap();
        let iso = tmp.path().join("x.iso");
        touch(&iso);
        let candidates = vec![iso];

        for bad in ["", "abc", "0", "2", "-1"] {
            let err = select_iso(&candidates, bad).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<WinUsbError>(),
                    Some(WinUsbError::InvalidIsoSelection(_))
                ),
                "input {:?}",
                bad
            );
        }
        let chosen = select_iso(&candidates, " 1 ").unwrap();
        assert!(chosen.is_absolute());
    }

    #[test]
    fn prompt_picks_indexed_iso() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("a.iso"));
        touch(&tmp.path().join("b.iso"));
        let prompter = ScriptedPrompter::new([Answer::Input("2".into())]);

        let chosen = prompt_for_iso(tmp.path(), &prompter).unwrap();
        assert_eq!(chosen.file_name().unwrap(), "b.iso");

        let menus = prompter.menus();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].1, vec!["1) a.iso", "2) b.iso"]);
    }

    #[test]
    fn explicit_iso_must_be_a_file() {
        let tmp = tempdir().unwrap();
        assert!(resolve_explicit_iso(tmp.path()).is_err());
        let iso = tmp.path().join("w.iso");
        touch(&iso);
        assert!(resolve_explicit_iso(&iso).is_ok());
    }
}
