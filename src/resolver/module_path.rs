//! Maps a dotted module name (`net.http`) to the directory that contains it
//! (spec §4.1).

use crate::diagnostics::{CompileError, ErrorKind};
use crate::resolver::file_filter::has_any_source_file;
use std::path::{Path, PathBuf};

pub const USER_MODULE_CACHE_DIR_NAME: &str = ".vmodules";

/// Resolves module names to directories, trying in order: relative to the
/// importing file, the stdlib root, then the user module cache
/// (`~/.vmodules/`). The first candidate that exists and contains at least
/// one source file wins.
pub struct ModulePathResolver<'a> {
    stdlib_root: &'a Path,
    user_module_cache: Option<PathBuf>,
}

impl<'a> ModulePathResolver<'a> {
    pub fn new(stdlib_root: &'a Path) -> Self {
        ModulePathResolver {
            stdlib_root,
            user_module_cache: dirs::home_dir().map(|home| home.join(USER_MODULE_CACHE_DIR_NAME)),
        }
    }

    #[cfg(test)]
    fn with_user_cache(stdlib_root: &'a Path, cache: PathBuf) -> Self {
        ModulePathResolver {
            stdlib_root,
            user_module_cache: Some(cache),
        }
    }

    /// `importing_file_dir` is the directory of the file whose `import`
    /// statement is being resolved; it anchors the first resolution
    /// attempt.
    pub fn resolve(
        &self,
        module_name: &str,
        importing_file_dir: &Path,
    ) -> Result<PathBuf, CompileError> {
        let relative_path = module_name.replace('.', std::path::MAIN_SEPARATOR_STR);

        let mut candidates = vec![importing_file_dir.join(&relative_path)];
        candidates.push(self.stdlib_root.join(&relative_path));
        if let Some(cache) = &self.user_module_cache {
            candidates.push(cache.join(&relative_path));
        }

        for candidate in &candidates {
            if candidate.is_dir() && has_any_source_file(candidate) {
                return Ok(candidate.clone());
            }
        }

        Err(CompileError::new(
            ErrorKind::ModuleNotFound,
            format!("module '{module_name}' not found"),
        )
        .with_note(format!("looked in {} location(s)", candidates.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolves_relative_to_importer_first() {
        let tmp = tempfile::tempdir().unwrap();
        let stdlib = tmp.path().join("stdlib");
        fs::create_dir_all(&stdlib).unwrap();

        let project = tmp.path().join("project");
        let util_dir = project.join("util");
        fs::create_dir_all(&util_dir).unwrap();
        fs::write(util_dir.join("util.v"), "").unwrap();

        let resolver = ModulePathResolver::with_user_cache(&stdlib, tmp.path().join("cache"));
        let resolved = resolver.resolve("util", &project).unwrap();
        assert_eq!(resolved, util_dir);
    }

    #[test]
    fn falls_back_to_stdlib_root() {
        let tmp = tempfile::tempdir().unwrap();
        let stdlib = tmp.path().join("stdlib");
        let os_dir = stdlib.join("os");
        fs::create_dir_all(&os_dir).unwrap();
        fs::write(os_dir.join("os.v"), "").unwrap();

        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let resolver = ModulePathResolver::with_user_cache(&stdlib, tmp.path().join("cache"));
        let resolved = resolver.resolve("os", &project).unwrap();
        assert_eq!(resolved, os_dir);
    }

    #[test]
    fn missing_module_is_module_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let stdlib = tmp.path().join("stdlib");
        fs::create_dir_all(&stdlib).unwrap();
        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let resolver = ModulePathResolver::with_user_cache(&stdlib, tmp.path().join("cache"));
        let err = resolver.resolve("nope.nope", &project).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModuleNotFound);
    }

    #[test]
    fn empty_directory_does_not_satisfy_resolution() {
        let tmp = tempfile::tempdir().unwrap();
        let stdlib = tmp.path().join("stdlib");
        fs::create_dir_all(&stdlib).unwrap();
        let project = tmp.path().join("project");
        // Directory exists but has no source files in it.
        fs::create_dir_all(project.join("empty")).unwrap();

        let resolver = ModulePathResolver::with_user_cache(&stdlib, tmp.path().join("cache"));
        let err = resolver.resolve("empty", &project).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ModuleNotFound);
    }
}
