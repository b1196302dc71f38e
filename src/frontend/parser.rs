//! Recursive-descent parsing of the token stream into the reference
//! frontend's [`ParsedFile`], plus the [`Parser`] type that plugs this
//! frontend into the driver's pass machinery (spec §4.5) and the
//! resolver's imports pass (spec §4.4).

use crate::diagnostics::{CompileError, ErrorKind};
use crate::driver::cgen_sink::CGenSink;
use crate::driver::pass_driver;
use crate::driver::symbol_table::SymbolTable;
use crate::frontend::ast::{Expr, FunctionDecl, ParsedFile, Statement};
use crate::frontend::codegen;
use crate::frontend::tokenizer::{self, Token, TokenKind};
use crate::resolver::FileImport;
use crate::resolver::build_assembler::ImportsScanner;
use std::fs;
use std::path::{Path, PathBuf};

struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        TokenCursor { tokens, index: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.index].kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.index].kind.clone();
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
        kind
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), CompileError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            let position = self.tokens[self.index].position;
            Err(CompileError::new(
                ErrorKind::ParseError,
                format!("expected {expected:?}, found {:?}", self.peek()),
            )
            .with_position(position))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match self.advance() {
            TokenKind::Ident(name) => Ok(name),
            other => {
                let position = self.tokens[self.index.saturating_sub(1)].position;
                Err(CompileError::new(
                    ErrorKind::ParseError,
                    format!("expected an identifier, found {other:?}"),
                )
                .with_position(position))
            }
        }
    }
}

pub fn parse_source(source: &str) -> Result<ParsedFile, CompileError> {
    let tokens = tokenizer::tokenize(source)?;
    let mut cursor = TokenCursor::new(tokens);
    let mut file = ParsedFile::default();

    loop {
        match cursor.peek().clone() {
            TokenKind::Eof => break,
            TokenKind::Import => {
                cursor.advance();
                file.imports.push(parse_dotted_path(&mut cursor)?);
            }
            TokenKind::FlagDirective(flag) => {
                cursor.advance();
                file.flags.push(flag);
            }
            TokenKind::Fn => {
                file.functions.push(parse_function(&mut cursor)?);
            }
            other => {
                let position = cursor.tokens[cursor.index].position;
                return Err(CompileError::new(
                    ErrorKind::ParseError,
                    format!("unexpected top-level token {other:?}"),
                )
                .with_position(position));
            }
        }
    }

    Ok(file)
}

fn parse_dotted_path(cursor: &mut TokenCursor) -> Result<String, CompileError> {
    let mut segments = vec![cursor.expect_ident()?];
    while cursor.peek() == &TokenKind::Dot {
        cursor.advance();
        segments.push(cursor.expect_ident()?);
    }
    Ok(segments.join("."))
}

fn parse_function(cursor: &mut TokenCursor) -> Result<FunctionDecl, CompileError> {
    cursor.expect(&TokenKind::Fn)?;
    let name = cursor.expect_ident()?;
    cursor.expect(&TokenKind::LParen)?;
    cursor.expect(&TokenKind::RParen)?;
    cursor.expect(&TokenKind::LBrace)?;

    let mut body = Vec::new();
    while cursor.peek() != &TokenKind::RBrace {
        body.push(parse_statement(cursor)?);
    }
    cursor.expect(&TokenKind::RBrace)?;

    Ok(FunctionDecl { name, body })
}

fn parse_statement(cursor: &mut TokenCursor) -> Result<Statement, CompileError> {
    match cursor.peek().clone() {
        TokenKind::Println => {
            cursor.advance();
            cursor.expect(&TokenKind::LParen)?;
            let expr = parse_expr(cursor)?;
            cursor.expect(&TokenKind::RParen)?;
            Ok(Statement::Println(expr))
        }
        TokenKind::Assert => {
            cursor.advance();
            Ok(Statement::Assert(parse_expr(cursor)?))
        }
        TokenKind::Ident(name) => {
            cursor.advance();
            cursor.expect(&TokenKind::LParen)?;
            cursor.expect(&TokenKind::RParen)?;
            Ok(Statement::Call(name))
        }
        other => {
            let position = cursor.tokens[cursor.index].position;
            Err(CompileError::new(
                ErrorKind::ParseError,
                format!("expected a statement, found {other:?}"),
            )
            .with_position(position))
        }
    }
}

fn parse_expr(cursor: &mut TokenCursor) -> Result<Expr, CompileError> {
    let lhs = parse_literal(cursor)?;
    if cursor.peek() == &TokenKind::EqEq {
        cursor.advance();
        let rhs = parse_literal(cursor)?;
        Ok(Expr::Eq(Box::new(lhs), Box::new(rhs)))
    } else {
        Ok(lhs)
    }
}

fn parse_literal(cursor: &mut TokenCursor) -> Result<Expr, CompileError> {
    let position = cursor.tokens[cursor.index].position;
    match cursor.advance() {
        TokenKind::Int(value) => Ok(Expr::Int(value)),
        TokenKind::Str(value) => Ok(Expr::Str(value)),
        TokenKind::Bool(value) => Ok(Expr::Bool(value)),
        other => Err(CompileError::new(
            ErrorKind::ParseError,
            format!("expected a literal, found {other:?}"),
        )
        .with_position(position)),
    }
}

/// Module membership follows the same directory grouping `ModulePathResolver`
/// relies on: every file directly under `project_root` belongs to `main`;
/// everything else belongs to the module named after its immediate parent
/// directory.
pub fn module_name_for_file(path: &Path, project_root: &Path) -> String {
    let parent = path.parent().unwrap_or(project_root);
    if parent == project_root {
        "main".to_string()
    } else {
        parent
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("main")
            .to_string()
    }
}

/// Constructed fresh per `(file, pass)` by `PassDriver` (spec §4.5), and
/// reused across many files by `BuildAssembler`'s imports-discovery loop
/// (spec §4.4) — it owns only the project root, and derives both the file
/// it's reading and its module name from the `path` argument each method
/// receives, never from stored state.
pub struct Parser {
    project_root: PathBuf,
}

impl Parser {
    pub fn new(project_root: PathBuf) -> Self {
        Parser { project_root }
    }

    fn read_and_parse(&self, path: &Path) -> Result<ParsedFile, CompileError> {
        let source = fs::read_to_string(path)
            .map_err(|e| CompileError::file_error(path, format!("cannot read source: {e}")))?;
        parse_source(&source).map_err(|e| e.with_file(path))
    }
}

impl ImportsScanner for Parser {
    fn scan_imports(&mut self, path: &Path) -> Result<FileImport, CompileError> {
        let parsed = self.read_and_parse(path)?;
        let module_name = module_name_for_file(path, &self.project_root);
        let mut import_record = FileImport::new(path.to_path_buf(), module_name);
        import_record.imports = parsed.imports;
        Ok(import_record)
    }
}

impl pass_driver::Parser for Parser {
    fn scan_imports(&mut self, path: &Path) -> Result<FileImport, CompileError> {
        <Self as ImportsScanner>::scan_imports(self, path)
    }

    fn run_decl_pass(&mut self, path: &Path, table: &mut SymbolTable) -> Result<(), CompileError> {
        let parsed = self.read_and_parse(path)?;
        let module_name = module_name_for_file(path, &self.project_root);
        table.register_module_file(&module_name, path);
        for function in &parsed.functions {
            table.declare_function(&function.name, &module_name);
        }
        Ok(())
    }

    fn run_main_pass(
        &mut self,
        path: &Path,
        _table: &mut SymbolTable,
        sink: &mut CGenSink,
    ) -> Result<(), CompileError> {
        let parsed = self.read_and_parse(path)?;
        for function in &parsed.functions {
            codegen::emit_function(sink, function);
        }
        Ok(())
    }
}

/// Collects every `#flag` directive in `path`, for `CCInvoker` (spec
/// §4.10) to fold into the toolchain argv. A standalone pass rather than a
/// `PassDriver` stage since flags are compiler-invocation metadata, not
/// symbol-table or C-output state.
pub fn collect_flags(path: &Path) -> Result<Vec<String>, CompileError> {
    let source = fs::read_to_string(path)
        .map_err(|e| CompileError::file_error(path, format!("cannot read source: {e}")))?;
    Ok(parse_source(&source).map_err(|e| e.with_file(path))?.flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_imports_flags_and_a_function() {
        let source = r#"
            import net.http
            #flag -lm

            fn main() {
                println("hello")
                assert 1 == 1
            }
        "#;
        let parsed = parse_source(source).unwrap();
        assert_eq!(parsed.imports, vec!["net.http".to_string()]);
        assert_eq!(parsed.flags, vec!["-lm".to_string()]);
        assert_eq!(parsed.functions.len(), 1);
        assert_eq!(parsed.functions[0].name, "main");
        assert_eq!(parsed.functions[0].body.len(), 2);
    }

    #[test]
    fn module_name_for_root_file_is_main() {
        let root = Path::new("/project");
        assert_eq!(module_name_for_file(Path::new("/project/main.v"), root), "main");
    }

    #[test]
    fn module_name_for_nested_file_is_its_directory() {
        let root = Path::new("/project");
        assert_eq!(
            module_name_for_file(Path::new("/project/util/helper.v"), root),
            "util"
        );
    }

    #[test]
    fn bare_identifier_call_parses_as_a_call_statement() {
        let parsed = parse_source("fn main() { helper() }").unwrap();
        assert_eq!(parsed.functions[0].body, vec![Statement::Call("helper".to_string())]);
    }

    #[test]
    fn malformed_function_signature_is_a_parse_error() {
        let err = parse_source("fn main( {}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }

    #[test]
    fn a_single_parser_instance_scans_several_files_by_their_own_path() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let main_file = root.join("main.v");
        fs::write(&main_file, "fn main() {}").unwrap();
        let util_dir = root.join("util");
        fs::create_dir_all(&util_dir).unwrap();
        let util_file = util_dir.join("helper.v");
        fs::write(&util_file, "fn helper() {}").unwrap();

        let mut parser = Parser::new(root.to_path_buf());
        let main_import = ImportsScanner::scan_imports(&mut parser, &main_file).unwrap();
        let util_import = ImportsScanner::scan_imports(&mut parser, &util_file).unwrap();
        assert_eq!(main_import.module_name, "main");
        assert_eq!(util_import.module_name, "util");
    }
}
