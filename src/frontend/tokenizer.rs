//! Character-stream tokenizer for the reference frontend.
//!
//! Grounded on the shape of the teacher's tokenizer
//! (`examples/nyejames-beanstalk/src/compiler_frontend/tokenizer/tokenizer.rs`):
//! a `next`/`peek` char stream producing a flat `Vec<Token>` with source
//! positions, newlines folded away rather than carried as tokens — scaled
//! down to the handful of constructs the reference language actually has.

use crate::diagnostics::{CompileError, ErrorKind, SourcePosition};
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Fn,
    Import,
    Println,
    Assert,
    Ident(String),
    Int(i64),
    Str(String),
    Bool(bool),
    /// The remainder of a `#flag ...` line, trimmed.
    FlagDirective(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Dot,
    EqEq,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: SourcePosition,
}

struct CharStream<'a> {
    chars: Chars<'a>,
    peeked: Option<char>,
    line: u32,
    col: u32,
}

impl<'a> CharStream<'a> {
    fn new(source: &'a str) -> Self {
        CharStream {
            chars: source.chars(),
            peeked: None,
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            col: self.col,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peeked.take().or_else(|| self.chars.next())?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut stream = CharStream::new(source);
    let mut tokens = Vec::new();

    loop {
        skip_whitespace_and_comments(&mut stream);
        let position = stream.position();
        let Some(ch) = stream.advance() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                position,
            });
            break;
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '.' => TokenKind::Dot,
            '=' if stream.peek() == Some('=') => {
                stream.advance();
                TokenKind::EqEq
            }
            '"' => TokenKind::Str(read_string_literal(&mut stream, position)?),
            '#' => TokenKind::FlagDirective(read_flag_directive(&mut stream)),
            c if c.is_ascii_digit() => TokenKind::Int(read_int_literal(&mut stream, c)),
            c if is_ident_start(c) => {
                let ident = read_ident(&mut stream, c);
                keyword_or_ident(ident)
            }
            other => {
                return Err(CompileError::new(
                    ErrorKind::ParseError,
                    format!("unexpected character '{other}'"),
                )
                .with_position(position));
            }
        };

        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

fn skip_whitespace_and_comments(stream: &mut CharStream) {
    loop {
        match stream.peek() {
            Some(c) if c.is_whitespace() => {
                stream.advance();
            }
            Some('/') => {
                let mut lookahead = stream.chars.clone();
                if lookahead.next() == Some('/') {
                    stream.advance();
                    stream.advance();
                    while let Some(c) = stream.peek() {
                        if c == '\n' {
                            break;
                        }
                        stream.advance();
                    }
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

fn read_ident(stream: &mut CharStream, first: char) -> String {
    let mut ident = String::new();
    ident.push(first);
    while let Some(c) = stream.peek() {
        if is_ident_continue(c) {
            ident.push(c);
            stream.advance();
        } else {
            break;
        }
    }
    ident
}

fn keyword_or_ident(ident: String) -> TokenKind {
    match ident.as_str() {
        "fn" => TokenKind::Fn,
        "import" => TokenKind::Import,
        "println" => TokenKind::Println,
        "assert" => TokenKind::Assert,
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        _ => TokenKind::Ident(ident),
    }
}

fn read_int_literal(stream: &mut CharStream, first: char) -> i64 {
    let mut digits = String::new();
    digits.push(first);
    while let Some(c) = stream.peek() {
        if c.is_ascii_digit() {
            digits.push(c);
            stream.advance();
        } else {
            break;
        }
    }
    digits.parse().unwrap_or(0)
}

fn read_string_literal(
    stream: &mut CharStream,
    start: SourcePosition,
) -> Result<String, CompileError> {
    let mut value = String::new();
    loop {
        match stream.advance() {
            Some('"') => return Ok(value),
            Some('\\') => match stream.advance() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(c) => value.push(c),
                None => break,
            },
            Some(c) => value.push(c),
            None => break,
        }
    }
    Err(CompileError::new(
        ErrorKind::ParseError,
        "unterminated string literal",
    )
    .with_position(start))
}

fn read_flag_directive(stream: &mut CharStream) -> String {
    // Caller already consumed '#'; expect "flag" then the rest of the line.
    let mut rest = String::new();
    while let Some(c) = stream.peek() {
        if c == '\n' {
            break;
        }
        rest.push(c);
        stream.advance();
    }
    rest.trim()
        .strip_prefix("flag")
        .unwrap_or(&rest)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_minimal_function() {
        let tokens = kinds("fn main() {\n    println(\"hi\")\n}\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Fn,
                TokenKind::Ident("main".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Println,
                TokenKind::LParen,
                TokenKind::Str("hi".into()),
                TokenKind::RParen,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        let tokens = kinds("// a comment\nfn\n");
        assert_eq!(tokens, vec![TokenKind::Fn, TokenKind::Eof]);
    }

    #[test]
    fn flag_directive_captures_rest_of_line() {
        let tokens = kinds("#flag -lm\nfn");
        assert_eq!(
            tokens,
            vec![
                TokenKind::FlagDirective("-lm".into()),
                TokenKind::Fn,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn dotted_import_path_tokenizes_as_idents_and_dots() {
        let tokens = kinds("import net.http");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Import,
                TokenKind::Ident("net".into()),
                TokenKind::Dot,
                TokenKind::Ident("http".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_a_parse_error() {
        let err = tokenize("\"never closed").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ParseError);
    }
}
