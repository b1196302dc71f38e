//! Unified error and warning types for the compiler driver.
//!
//! Every fatal condition the driver can hit boils down to one of the
//! `ErrorKind` variants from the specification (resolver failures,
//! entry-point policy violations, back-end failures, ...). Rather than a
//! different error type per component, everything funnels through a single
//! [`CompileError`], constructed with small free functions so call sites
//! read as one sentence instead of a struct literal.

use saying::say;
use std::fmt;
use std::path::{Path, PathBuf};

/// The fixed set of fatal error kinds the core can surface (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoInputFiles,
    PathNotFound,
    NotADirectory,
    ModuleNotFound,
    ImportCycle,
    ParseError,
    MissingMain,
    TestWithMain,
    NoTestFunctions,
    ToolchainNotFound,
    UnsupportedLinkDirective,
    CompileFailure,
    InvalidFlag,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::NoInputFiles => "No Input Files",
            ErrorKind::PathNotFound => "Path Not Found",
            ErrorKind::NotADirectory => "Not A Directory",
            ErrorKind::ModuleNotFound => "Module Not Found",
            ErrorKind::ImportCycle => "Import Cycle",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::MissingMain => "Missing Main",
            ErrorKind::TestWithMain => "Test Build Has A Main",
            ErrorKind::NoTestFunctions => "No Test Functions",
            ErrorKind::ToolchainNotFound => "Toolchain Not Found",
            ErrorKind::UnsupportedLinkDirective => "Unsupported Link Directive",
            ErrorKind::CompileFailure => "Compile Failure",
            ErrorKind::InvalidFlag => "Invalid Flag",
        }
    }
}

/// A 1-based line/column pair, owned (no string-table dependency).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: u32,
    pub col: u32,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<PathBuf>,
    pub position: Option<SourcePosition>,
    pub notes: Vec<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
            file: None,
            position: None,
            notes: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convenience constructor for the common "couldn't touch the filesystem" case.
    pub fn file_error(file: impl AsRef<Path>, message: impl Into<String>) -> Self {
        CompileError::new(ErrorKind::PathNotFound, message).with_file(file)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(file) = &self.file {
            write!(f, " ({}", file.display())?;
            if let Some(pos) = self.position {
                write!(f, ":{}:{}", pos.line, pos.col)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

#[derive(Debug, Clone)]
pub struct CompileWarning {
    pub message: String,
    pub file: Option<PathBuf>,
    pub position: Option<SourcePosition>,
}

impl CompileWarning {
    pub fn new(message: impl Into<String>) -> Self {
        CompileWarning {
            message: message.into(),
            file: None,
            position: None,
        }
    }

    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }
}

/// Prints a single fatal diagnostic with the `V error:` prefix required by
/// §7's propagation policy, including the captured back-end output when
/// present (stored as additional notes by the caller).
pub fn print_error(error: &CompileError) {
    say!(Inline Red Bold "V error: ");
    say!(Inline Red "[", error.kind.label(), "] ");
    say!(Red error);
    for note in &error.notes {
        say!(Bright Black "  ", note);
    }
}

pub fn print_warning(warning: &CompileWarning) {
    say!(Inline Yellow Bold "V warning: ");
    say!(Yellow &warning.message);
    if let Some(file) = &warning.file {
        say!(Bright Black "  (", file.display(), ")");
    }
}

/// Builds a [`CompileError`] with a one-line `format!` body, mirroring the
/// teacher's `return_*_error!` macros but without the per-error-site enum
/// boilerplate, since this driver only has one flat set of kinds.
#[macro_export]
macro_rules! compile_error {
    ($kind:expr, $($arg:tt)*) => {
        $crate::diagnostics::CompileError::new($kind, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_file_and_position() {
        let err = CompileError::new(ErrorKind::ParseError, "unexpected token")
            .with_file("main.v")
            .with_position(SourcePosition { line: 3, col: 7 });
        assert_eq!(err.to_string(), "unexpected token (main.v:3:7)");
    }

    #[test]
    fn display_without_position_omits_colon() {
        let err = CompileError::new(ErrorKind::NoInputFiles, "nothing to build").with_file("src");
        assert_eq!(err.to_string(), "nothing to build (src)");
    }
}
