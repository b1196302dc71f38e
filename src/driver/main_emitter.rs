//! Emits the program entry point: constant/arena initialisation, the
//! `_STR`/`_STR_TMP` string helpers, and `main` itself in one of three
//! modes (spec §4.7).

use crate::diagnostics::{CompileError, ErrorKind};
use crate::driver::cgen_sink::CGenSink;
use crate::driver::symbol_table::SymbolTable;
use crate::preferences::Preferences;

/// Emits `__init_consts`, which sets up the string-buffer arena, performs
/// Windows console setup, then calls every module's `<mod>__init_module`.
/// The modules themselves have no module-scope initialisers in this
/// reference frontend, so their `__init_module` bodies are empty stubs
/// (see [`emit_module_init_stubs`]) kept only so hot-reload's `load_so`
/// has a stable symbol to rebind per module.
pub fn emit_init_consts(sink: &mut CGenSink, module_names: &[String]) {
    sink.push_fn_forward_decl("void __init_consts(void);");
    sink.emit_line("void __init_consts(void) {");
    sink.emit_line("    __string_arena_init();");
    sink.emit_line("#ifdef _WIN32");
    sink.emit_line("    SetConsoleOutputCP(CP_UTF8);");
    sink.emit_line("    __win_enable_virtual_terminal();");
    sink.emit_line("#endif");
    for name in module_names {
        sink.emit_line(format!("    {name}__init_module();"));
    }
    sink.emit_line("}");
}

/// Emits an empty `<mod>__init_module` for every module and records each
/// as a hot-reload symbol, so `__init_consts`'s calls above always resolve.
pub fn emit_module_init_stubs(sink: &mut CGenSink, module_names: &[String]) {
    for name in module_names {
        let symbol = format!("{name}__init_module");
        sink.push_fn_forward_decl(format!("void {symbol}(void);"));
        sink.emit_line(format!("void {symbol}(void) {{}}"));
        sink.push_so_fn(symbol);
    }
}

/// The reference frontend has no dynamic string formatting, so the arena
/// is a deliberate no-op and `_STR`/`_STR_TMP` simply hand back the
/// (statically-allocated) literal they were given.
pub fn emit_string_helpers(sink: &mut CGenSink) {
    sink.push_fn_forward_decl("static void __string_arena_init(void);");
    sink.push_fn_forward_decl("char *_STR(const char *s);");
    sink.push_fn_forward_decl("char *_STR_TMP(const char *s);");
    sink.emit_line("static void __string_arena_init(void) {}");
    sink.emit_line("char *_STR(const char *s) { return (char *)s; }");
    sink.emit_line("char *_STR_TMP(const char *s) { return (char *)s; }");
}

/// Selects and emits `main` in one of the three modes this component
/// supports. Called after the `main` pass has run, so `table` already
/// reflects whether the user declared their own `main`.
pub fn emit_entry_point(
    prefs: &Preferences,
    table: &SymbolTable,
    sink: &mut CGenSink,
) -> Result<(), CompileError> {
    if prefs.is_so || prefs.build_mode == crate::preferences::BuildMode::BuildModule {
        // Library/object build: no main, the host process drives init itself.
        return Ok(());
    }

    if prefs.is_test {
        return emit_test_entry_point(table, sink);
    }

    if table.has_function("main") {
        // User main was already emitted during the main pass.
        return Ok(());
    }

    if prefs.is_script {
        // No user `main` was declared, so the script's own top-level
        // functions (each already returning its own assertion-failure
        // count, spec §4.6) are the generated entry: call every one of
        // them from a synthesised `main`, the same summing idiom
        // `emit_test_entry_point` uses below.
        sink.emit_line("int main(void) {");
        sink.emit_line("    __init_consts();");
        sink.emit_line("    int failures = 0;");
        for name in table.function_names() {
            sink.emit_line(format!("    failures += {name}();"));
        }
        sink.emit_line("    return failures != 0;");
        sink.emit_line("}");
        return Ok(());
    }

    Err(CompileError::new(
        ErrorKind::MissingMain,
        "no main function declared",
    ))
}

fn emit_test_entry_point(table: &SymbolTable, sink: &mut CGenSink) -> Result<(), CompileError> {
    sink.push_include("#include <stdio.h>");
    if table.has_function("main") {
        return Err(CompileError::new(
            ErrorKind::TestWithMain,
            "a test build may not declare its own main",
        ));
    }

    let tests = table.test_function_names();
    if tests.is_empty() {
        return Err(CompileError::new(
            ErrorKind::NoTestFunctions,
            "no functions beginning with test_ were found",
        ));
    }

    sink.emit_line("int main(void) {");
    sink.emit_line("    __init_consts();");
    sink.emit_line("    int failures = 0;");
    sink.emit_line("    int result;");
    for name in &tests {
        sink.emit_line(format!("    result = {name}();"));
        sink.emit_line(format!(
            "    if (result) {{ printf(\"FAIL %s\\n\", \"{name}\"); }}"
        ));
        sink.emit_line("    failures += result;");
    }
    sink.emit_line("    return failures != 0;");
    sink.emit_line("}");
    Ok(())
}
