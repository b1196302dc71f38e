//! Expands a user-supplied file or directory into the full, dependency
//! ordered build unit (spec §4.4).
//!
//! Grounded on the teacher's `compile_project_frontend`
//! (`examples/nyejames-beanstalk/src/build_system/create_project_modules.rs`):
//! single-file vs. directory branch, then a discovery pass that widens the
//! file set until nothing new turns up.

use crate::diagnostics::{CompileError, ErrorKind};
use crate::preferences::{BuildMode, Preferences, SOURCE_EXTENSION};
use crate::resolver::FileImport;
use crate::resolver::file_filter::list_source_files;
use crate::resolver::import_graph::topological_order;
use crate::resolver::module_path::ModulePathResolver;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

pub const BUILTIN_MODULE_DIR: &str = "builtin";

/// The imports-pass capability `BuildAssembler` drives. Implemented by the
/// real frontend (`crate::frontend`); a driver-internal trait rather than
/// `crate::frontend::Parser` directly so the resolver doesn't need to know
/// about decl/main passes at all.
pub trait ImportsScanner {
    fn scan_imports(&mut self, path: &Path) -> Result<FileImport, CompileError>;
}

fn determine_user_files(prefs: &Preferences, entry_path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if !entry_path.exists() {
        return Err(CompileError::new(
            ErrorKind::PathNotFound,
            format!("path does not exist: {}", entry_path.display()),
        )
        .with_file(entry_path));
    }

    if entry_path.is_file() {
        return Ok(vec![entry_path.to_path_buf()]);
    }

    if !entry_path.is_dir() {
        return Err(CompileError::new(
            ErrorKind::NotADirectory,
            format!("not a file or directory: {}", entry_path.display()),
        )
        .with_file(entry_path));
    }

    Ok(list_source_files(entry_path, prefs.target_os, prefs.is_test))
}

/// Runs the full build-unit assembly algorithm of §4.4 and returns the
/// ordered list of source files to feed the `PassDriver`.
pub fn assemble(
    prefs: &Preferences,
    entry_path: &Path,
    scanner: &mut dyn ImportsScanner,
) -> Result<Vec<PathBuf>, CompileError> {
    let user_files = determine_user_files(prefs, entry_path)?;
    if user_files.is_empty() {
        return Err(CompileError::new(
            ErrorKind::NoInputFiles,
            "no input files to compile".to_string(),
        )
        .with_file(entry_path));
    }

    let builtin_dir = prefs.stdlib_root.join(BUILTIN_MODULE_DIR);
    let builtin_files = if builtin_dir.is_dir() {
        list_source_files(&builtin_dir, prefs.target_os, false)
    } else {
        Vec::new()
    };

    let resolver = ModulePathResolver::new(&prefs.stdlib_root);

    // spec §4.1(a): resolution is first relative to the importing file's
    // own directory, so a module nested under a subdirectory can have its
    // own sibling submodules without the project root shadowing them. Only
    // once that fails do we retry from the project root, so that two
    // top-level module directories can still cross-import each other (the
    // project root *is* "the current compilation unit's directory" for
    // every file directly under it, e.g. `main.v`, so this is a fallback,
    // not a second primary anchor).
    let project_root: PathBuf = if entry_path.is_dir() {
        entry_path.to_path_buf()
    } else {
        entry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    let mut file_imports: Vec<FileImport> = Vec::new();
    let mut scanned_paths: FxHashSet<PathBuf> = FxHashSet::default();
    let mut known_module_dirs: FxHashSet<PathBuf> = FxHashSet::default();
    known_module_dirs.insert(builtin_dir.clone());

    // The work queue grows as newly discovered modules' files are
    // appended; a `while cursor < work.len()` loop runs the imports pass
    // to fixpoint without re-visiting already-scanned files (step 3-4).
    let mut work: Vec<PathBuf> = Vec::new();
    work.extend(builtin_files.iter().cloned());
    work.extend(user_files.iter().cloned());

    let mut cursor = 0;
    while cursor < work.len() {
        let path = work[cursor].clone();
        cursor += 1;
        if !scanned_paths.insert(path.clone()) {
            continue;
        }

        let import_record = scanner.scan_imports(&path)?;

        let importing_dir = path.parent().unwrap_or(&project_root);
        for imported_name in &import_record.imports {
            let module_dir = resolver
                .resolve(imported_name, importing_dir)
                .or_else(|_| resolver.resolve(imported_name, &project_root))?;
            if known_module_dirs.insert(module_dir.clone()) {
                work.extend(list_source_files(&module_dir, prefs.target_os, false));
            }
        }

        file_imports.push(import_record);
    }

    let builtin_module_name = file_imports
        .iter()
        .find(|fi| builtin_files.contains(&fi.file_path))
        .map(|fi| fi.module_name.clone())
        .unwrap_or_else(|| BUILTIN_MODULE_DIR.to_string());

    let order = topological_order(&file_imports, &builtin_module_name)?;

    // In `build module` mode the module under construction is compiled
    // from its own directory as "user files"; skip it in the imported-
    // module section so it isn't duplicated ahead of itself.
    let current_module = if prefs.build_mode == BuildMode::BuildModule {
        file_imports
            .iter()
            .find(|fi| Some(&fi.file_path) == user_files.first())
            .map(|fi| fi.module_name.clone())
    } else {
        None
    };

    let mut final_list: Vec<PathBuf> = Vec::with_capacity(file_imports.len());
    final_list.extend(builtin_files.iter().cloned());

    for module in &order {
        if module == &builtin_module_name || Some(module) == current_module.as_ref() {
            continue;
        }
        let mut files_for_module: Vec<PathBuf> = file_imports
            .iter()
            .filter(|fi| &fi.module_name == module)
            .map(|fi| fi.file_path.clone())
            .collect();
        files_for_module.sort();
        final_list.extend(files_for_module);
    }

    final_list.extend(user_files.iter().cloned());

    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    final_list.retain(|path| seen.insert(path.clone()));

    Ok(final_list)
}

/// Whether `path` looks like a single compilable source file (used by the
/// CLI before it hands an entry path to `assemble`).
pub fn is_single_source_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}
