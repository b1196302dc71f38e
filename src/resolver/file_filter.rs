//! Platform/suffix filtering of `.v` source files in a directory
//! (spec §4.2).

use crate::preferences::{HEADER_EXTENSION, SOURCE_EXTENSION, TargetOs};
use std::fs;
use std::path::{Path, PathBuf};

const PLATFORM_SUFFIXES: &[&str] = &["_win", "_lin", "_mac", "_nix", "_js", "_c"];

/// Whether a file carrying one of the recognised platform suffixes should
/// be included for `target_os`. Files without a recognised suffix are
/// always included (suffix filtering doesn't apply to them).
fn platform_suffix_matches(stem: &str, target_os: TargetOs) -> bool {
    if stem.ends_with("_win") {
        target_os.is_windows()
    } else if stem.ends_with("_lin") {
        target_os == TargetOs::Linux
    } else if stem.ends_with("_mac") {
        target_os == TargetOs::Mac
    } else if stem.ends_with("_nix") {
        !target_os.is_windows()
    } else if stem.ends_with("_js") {
        target_os.is_js()
    } else if stem.ends_with("_c") {
        !target_os.is_js()
    } else {
        true
    }
}

fn is_test_file(stem: &str) -> bool {
    stem.ends_with("_test")
}

fn has_recognised_platform_suffix(stem: &str) -> bool {
    PLATFORM_SUFFIXES.iter().any(|suffix| stem.ends_with(suffix))
}

fn is_source_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(SOURCE_EXTENSION) | Some(HEADER_EXTENSION)
    )
}

/// Lists the source files directly inside `dir` that survive platform and
/// test-mode filtering, in deterministic (lexicographic-by-filename) order.
pub fn list_source_files(dir: &Path, target_os: TargetOs, include_tests: bool) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| is_source_extension(path))
            .filter(|path| {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
                (include_tests || !is_test_file(stem)) && platform_suffix_matches(stem, target_os)
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    entries
}

/// Used by [`crate::resolver::module_path`] to decide whether a directory
/// is a real module (vs. an empty or non-source directory).
pub fn has_any_source_file(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| {
            entries.any(|entry| {
                entry
                    .ok()
                    .map(|e| is_source_extension(&e.path()))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Whether `stem` (filename without extension) carries a recognised
/// platform suffix not matching `target_os` — exposed for the import-pass
/// callers that need to re-check a single already-known file.
pub fn excluded_by_platform(stem: &str, target_os: TargetOs) -> bool {
    has_recognised_platform_suffix(stem) && !platform_suffix_matches(stem, target_os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn platform_filter_keeps_only_the_matching_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a_win.v");
        touch(tmp.path(), "a_lin.v");
        touch(tmp.path(), "a_mac.v");
        touch(tmp.path(), "main.v");

        let linux_files = list_source_files(tmp.path(), TargetOs::Linux, false);
        let names: Vec<_> = linux_files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a_lin.v", "main.v"]);
    }

    #[test]
    fn nix_suffix_excluded_on_windows_only() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "posix_only_nix.v");

        assert!(
            list_source_files(tmp.path(), TargetOs::Linux, false)
                .iter()
                .any(|p| p.ends_with("posix_only_nix.v"))
        );
        assert!(
            list_source_files(tmp.path(), TargetOs::Windows, false)
                .iter()
                .all(|p| !p.ends_with("posix_only_nix.v"))
        );
    }

    #[test]
    fn test_files_excluded_unless_test_mode() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "thing_test.v");
        touch(tmp.path(), "thing.v");

        assert_eq!(list_source_files(tmp.path(), TargetOs::Linux, false).len(), 1);
        assert_eq!(list_source_files(tmp.path(), TargetOs::Linux, true).len(), 2);
    }

    #[test]
    fn non_source_extensions_are_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "readme.md");
        touch(tmp.path(), "main.v");

        let files = list_source_files(tmp.path(), TargetOs::Linux, false);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "zeta.v");
        touch(tmp.path(), "alpha.v");
        touch(tmp.path(), "mid.v");

        let files = list_source_files(tmp.path(), TargetOs::Linux, false);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["alpha.v", "mid.v", "zeta.v"]);
    }
}
