//! Top-level build orchestration: wires `BuildAssembler`, `PassDriver`,
//! `MainEmitter`, `HotReloadEmitter` and the backend together into one
//! `build()` entry point, the way the teacher's own `build_project`
//! (`examples/nyejames-beanstalk/src/build_system/build.rs`) sequences
//! frontend compilation and backend invocation without duplicating either.

use crate::backend;
use crate::diagnostics::CompileError;
use crate::driver::cgen_sink::CGenSink;
use crate::driver::hot_reload;
use crate::driver::main_emitter;
use crate::driver::pass_driver::PassDriver;
use crate::driver::symbol_table::SymbolTable;
use crate::frontend;
use crate::frontend::parser::collect_flags;
use crate::preferences::Preferences;
use crate::toolchain::cc_invoker::{classify_flag, LinkFlag};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Runs one full build: assemble the file list, drive the three passes,
/// emit the entry point, and hand the result to the selected backend.
pub fn build(prefs: &Preferences, entry_path: &Path) -> Result<(), CompileError> {
    let project_root = if entry_path.is_dir() {
        entry_path.to_path_buf()
    } else {
        entry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Path::new(".").to_path_buf())
    };

    let start = Instant::now();
    let mut scanner = frontend::Parser::new(project_root.clone());
    let files = crate::resolver::build_assembler::assemble(prefs, entry_path, &mut scanner)?;
    crate::stage_log!(prefs, "assembled build unit");

    let driver = PassDriver::new(|| frontend::Parser::new(project_root.clone()));
    let mut table = SymbolTable::new();

    let imports = driver.run_imports_pass(&files)?;
    for file_import in &imports {
        for imported in &file_import.imports {
            table.record_import(imported);
        }
    }
    crate::stage_log!(prefs, "imports pass complete");

    driver.run_decl_pass(&files, &mut table)?;
    crate::stage_log!(prefs, "decl pass complete");

    let mut flags: Vec<LinkFlag> = Vec::new();
    if !prefs.cflags.is_empty() {
        flags.extend(prefs.cflags.split_whitespace().map(|f| classify_flag(f)));
    }
    for file in &files {
        for flag in collect_flags(file)? {
            flags.push(classify_flag(&flag));
        }
    }

    let mut sink = CGenSink::new();
    driver.run_main_pass(&files, &mut table, &mut sink)?;
    crate::stage_log!(prefs, "main pass complete");

    main_emitter::emit_string_helpers(&mut sink);
    let module_names: Vec<String> = table.module_names().into_iter().map(String::from).collect();
    main_emitter::emit_module_init_stubs(&mut sink, &module_names);
    main_emitter::emit_init_consts(&mut sink, &module_names);
    main_emitter::emit_entry_point(prefs, &table, &mut sink)?;

    if prefs.is_live {
        let stem = entry_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&prefs.out_name);
        hot_reload::emit_hot_reload_shim(&mut sink, prefs, stem);
    }

    let tmp_c_path = prefs.tmp_c_path();
    sink.save(&tmp_c_path)?;
    crate::stage_log!(prefs, "C emitted");

    // A live-mode build needs an initial shared object for the emitted
    // `load_so` to find at startup, produced before the main program links
    // (spec §4.8).
    if prefs.is_live && !prefs.is_so {
        let mut so_prefs = prefs.clone();
        so_prefs.is_so = true;
        let kind = backend::select_backend(&so_prefs);
        backend::run_backend(kind, &so_prefs, &flags, &tmp_c_path, &so_prefs.final_out_name())?;
    }

    let kind = backend::select_backend(prefs);
    let result = backend::run_backend(kind, prefs, &flags, &tmp_c_path, &prefs.final_out_name());

    match result {
        Ok(()) => {
            if !prefs.is_debug {
                let _ = fs::remove_file(&tmp_c_path);
            }
            crate::stage_log!(prefs, "build finished");
            let _ = start.elapsed();
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_main_is_reported_before_any_backend_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("main.v"), "fn helper() {}").unwrap();

        let mut prefs = Preferences::default();
        prefs.stdlib_root = tmp.path().join("stdlib");
        prefs.out_name = tmp.path().join("a.out").to_string_lossy().into_owned();

        let err = build(&prefs, &project).unwrap_err();
        assert_eq!(err.kind, crate::diagnostics::ErrorKind::MissingMain);
    }

    #[test]
    fn js_target_is_rejected_before_writing_any_output() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("main.v"), "fn main() { println(\"hi\") }").unwrap();

        let mut prefs = Preferences::default();
        prefs.stdlib_root = tmp.path().join("stdlib");
        prefs.out_name = tmp.path().join("a.out").to_string_lossy().into_owned();
        prefs.target_os = crate::preferences::TargetOs::Js;

        let err = build(&prefs, &project).unwrap_err();
        assert_eq!(err.kind, crate::diagnostics::ErrorKind::CompileFailure);
    }
}
