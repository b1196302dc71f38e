//! Runs the fixed `imports -> decl -> main` pass sequence over an ordered
//! file list (spec §4.5).
//!
//! One fresh [`Parser`] per `(file, pass)` pair, built the way the teacher
//! builds a fresh `JsEmitter` per lowering call
//! (`examples/nyejames-beanstalk/src/backends/js/mod.rs::lower_hir_to_js`)
//! rather than reusing one across files — parsers never carry state
//! between passes, the symbol table and sink do.

use crate::diagnostics::CompileError;
use crate::driver::cgen_sink::CGenSink;
use crate::driver::symbol_table::SymbolTable;
use crate::resolver::FileImport;
use std::path::{Path, PathBuf};

/// One pass-capable parser, instantiated fresh for every `(file, pass)`.
pub trait Parser {
    fn scan_imports(&mut self, path: &Path) -> Result<FileImport, CompileError>;
    fn run_decl_pass(&mut self, path: &Path, table: &mut SymbolTable) -> Result<(), CompileError>;
    fn run_main_pass(
        &mut self,
        path: &Path,
        table: &mut SymbolTable,
        sink: &mut CGenSink,
    ) -> Result<(), CompileError>;
}

/// Drives the three passes over the build list produced by `BuildAssembler`.
/// Takes a parser factory rather than owning one instance, since a fresh
/// parser is constructed per file per pass.
pub struct PassDriver<F> {
    new_parser: F,
}

impl<F, P> PassDriver<F>
where
    F: Fn() -> P,
    P: Parser,
{
    pub fn new(new_parser: F) -> Self {
        PassDriver { new_parser }
    }

    /// Within a pass, files run in the order BuildAssembler produced
    /// (ordering guarantee, spec §4.5).
    pub fn run_imports_pass(&self, files: &[PathBuf]) -> Result<Vec<FileImport>, CompileError> {
        files
            .iter()
            .map(|file| (self.new_parser)().scan_imports(file))
            .collect()
    }

    pub fn run_decl_pass(
        &self,
        files: &[PathBuf],
        table: &mut SymbolTable,
    ) -> Result<(), CompileError> {
        for file in files {
            (self.new_parser)().run_decl_pass(file, table)?;
        }
        Ok(())
    }

    /// Every file finishes `decl` before any file begins `main` — enforced
    /// simply by the caller invoking `run_decl_pass` to completion first.
    pub fn run_main_pass(
        &self,
        files: &[PathBuf],
        table: &mut SymbolTable,
        sink: &mut CGenSink,
    ) -> Result<(), CompileError> {
        for file in files {
            (self.new_parser)().run_main_pass(file, table, sink)?;
        }
        Ok(())
    }
}
