//! Line-oriented C output sink with a single replace-once marker
//! (spec §4.6).
//!
//! `body` plays the role of the teacher's `JsEmitter::out`
//! (`examples/nyejames-beanstalk/src/backends/js/mod.rs`) — an
//! append-only buffer filled by `emit_line` during code generation —
//! generalised here into the side-buffer-plus-reserved-slot shape the
//! C backend needs.

use crate::diagnostics::CompileError;
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
pub struct CGenSink {
    includes: Vec<String>,
    typedefs: Vec<String>,
    fns: Vec<String>,
    consts: Vec<String>,
    consts_init: Vec<String>,
    thread_args: Vec<String>,
    so_fns: Vec<String>,
    reserved_slot: String,
    body: Vec<String>,
}

impl CGenSink {
    pub fn new() -> Self {
        CGenSink::default()
    }

    /// No-op if `line` was already pushed — callers may be invoked once per
    /// emitted function, but headers should only appear once in the output.
    pub fn push_include(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !self.includes.contains(&line) {
            self.includes.push(line);
        }
    }

    pub fn push_typedef(&mut self, line: impl Into<String>) {
        self.typedefs.push(line.into());
    }

    pub fn push_fn_forward_decl(&mut self, line: impl Into<String>) {
        self.fns.push(line.into());
    }

    pub fn push_const(&mut self, line: impl Into<String>) {
        self.consts.push(line.into());
    }

    pub fn push_const_init(&mut self, line: impl Into<String>) {
        self.consts_init.push(line.into());
    }

    pub fn push_thread_arg(&mut self, line: impl Into<String>) {
        self.thread_args.push(line.into());
    }

    /// Records a symbol that must be resolved dynamically under live mode
    /// (`HotReloadEmitter::load_so`).
    pub fn push_so_fn(&mut self, symbol: impl Into<String>) {
        self.so_fns.push(symbol.into());
    }

    pub fn so_fns(&self) -> &[String] {
        &self.so_fns
    }

    /// Appends a line to the main body (per-file main-pass output, the
    /// entry point, and the hot-reload shim all land here, in that order).
    pub fn emit_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    /// Rewrites the reserved definitions slot. The driver calls this once,
    /// after the `decl` pass has determined the full set of aggregated
    /// typedefs/forward-decls/string-helper declarations.
    pub fn set_reserved_definitions(&mut self, content: impl Into<String>) {
        self.reserved_slot = content.into();
    }

    /// Concatenates `side-buffers ∥ reserved-slot-content ∥ body-lines`.
    /// Pure and side-effect free, so callers may invoke it as often as
    /// they like before `save`.
    pub fn finalize(&self) -> String {
        let mut out = String::new();
        for section in [&self.includes, &self.typedefs, &self.fns] {
            for line in section {
                out.push_str(line);
                out.push('\n');
            }
        }
        if !self.reserved_slot.is_empty() {
            out.push_str(&self.reserved_slot);
            out.push('\n');
        }
        for section in [&self.consts, &self.consts_init, &self.thread_args] {
            for line in section {
                out.push_str(line);
                out.push('\n');
            }
        }
        for line in &self.body {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Writes the finalized output to `path`. Idempotent — the sink is
    /// read-only during `finalize`, so saving twice produces identical
    /// bytes.
    pub fn save(&self, path: &Path) -> Result<(), CompileError> {
        fs::write(path, self.finalize())
            .map_err(|e| CompileError::file_error(path, format!("cannot write C output: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_appear_in_spec_order() {
        let mut sink = CGenSink::new();
        sink.emit_line("int main() {}");
        sink.push_const("int x;");
        sink.push_typedef("typedef int myint;");
        sink.push_include("#include <stdio.h>");
        sink.set_reserved_definitions("/* forward decls */");

        let out = sink.finalize();
        let pos = |needle: &str| out.find(needle).unwrap();
        assert!(pos("#include") < pos("typedef"));
        assert!(pos("typedef") < pos("forward decls"));
        assert!(pos("forward decls") < pos("int x;"));
        assert!(pos("int x;") < pos("int main"));
    }

    #[test]
    fn empty_reserved_slot_emits_nothing() {
        let mut sink = CGenSink::new();
        sink.emit_line("body");
        assert_eq!(sink.finalize(), "body\n");
    }

    #[test]
    fn save_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.tmp.c");
        let mut sink = CGenSink::new();
        sink.emit_line("int main() { return 0; }");

        sink.save(&path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        sink.save(&path).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn so_fns_are_exposed_for_hot_reload() {
        let mut sink = CGenSink::new();
        sink.push_so_fn("my_module__init_module");
        assert_eq!(sink.so_fns(), &["my_module__init_module".to_string()]);
    }
}
