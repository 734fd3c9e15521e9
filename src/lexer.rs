// Copyright (c) 2025 Brian G. Milnes
// SPDX-License-Identifier: MIT

//! Tokenizer for the supported Go subset.
//!
//! Implements Go's automatic semicolon insertion: a newline after an
//! identifier, literal, `)`, `]`, `}`, `++`, `--`, `return`, `break`,
//! `continue` or `fallthrough` yields a `Semi` token. Comments are captured
//! separately with positions so the parser can reattach them to the
//! declaration or statement that follows.

use crate::syntax::Pos;
use thiserror::Error;

/// A lexical or syntactic error with its source position.
#[derive(Debug, Error)]
#[error("{pos}: {message}")]
pub struct SyntaxError {
    pub pos: Pos,
    pub message: String,
}

impl SyntaxError {
    pub fn new(pos: Pos, message: impl Into<String>) -> Self {
        SyntaxError { pos, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokKind {
    Ident(String),
    Int(String),
    Float(String),
    Imag(String),
    Char(String),
    Str(String),

    // Keywords.
    Package,
    Import,
    Func,
    Var,
    Const,
    Type,
    Return,
    If,
    Else,
    For,
    Range,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Go,
    Defer,
    Struct,
    Map,
    Interface,
    Fallthrough,

    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBrack,
    RBrack,
    Comma,
    Semi,
    Colon,
    Dot,
    Ellipsis,

    // Operators.
    Assign,
    Define,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    AmpCaret,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,
    ShlEq,
    ShrEq,
    AmpCaretEq,
    AndAnd,
    OrOr,
    Not,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Inc,
    Dec,

    Eof,
}

impl TokKind {
    /// Whether a newline directly after this token inserts a semicolon.
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokKind::Ident(_)
                | TokKind::Int(_)
                | TokKind::Float(_)
                | TokKind::Imag(_)
                | TokKind::Char(_)
                | TokKind::Str(_)
                | TokKind::Return
                | TokKind::Break
                | TokKind::Continue
                | TokKind::Fallthrough
                | TokKind::Inc
                | TokKind::Dec
                | TokKind::RParen
                | TokKind::RBrack
                | TokKind::RBrace
        )
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokKind,
    pub pos: Pos,
}

/// A comment with its position; text includes the `//` or `/* */` markers.
#[derive(Debug, Clone)]
pub struct Comment {
    pub pos: Pos,
    pub text: String,
}

/// Tokenize `source`, returning tokens and comments.
pub fn scan(source: &str) -> Result<(Vec<Token>, Vec<Comment>), SyntaxError> {
    Scanner::new(source).scan_all()
}

struct Scanner {
    chars: Vec<char>,
    idx: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            idx: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn pos(&self) -> Pos {
        Pos { line: self.line, col: self.col }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.chars.get(self.idx + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.idx).copied()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn push(&mut self, kind: TokKind, pos: Pos) {
        self.tokens.push(Token { kind, pos });
    }

    /// Emit a semicolon if the previous token would end a statement.
    fn maybe_insert_semi(&mut self, pos: Pos) {
        if self.tokens.last().is_some_and(|t| t.kind.ends_statement()) {
            self.push(TokKind::Semi, pos);
        }
    }

    fn scan_all(mut self) -> Result<(Vec<Token>, Vec<Comment>), SyntaxError> {
        while let Some(c) = self.peek() {
            let pos = self.pos();
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    self.maybe_insert_semi(pos);
                }
                '/' if self.peek2() == Some('/') => self.scan_line_comment(pos),
                '/' if self.peek2() == Some('*') => self.scan_block_comment(pos)?,
                c if c.is_alphabetic() || c == '_' => self.scan_ident(pos),
                c if c.is_ascii_digit() => self.scan_number(pos),
                '.' if self.peek2().is_some_and(|c| c.is_ascii_digit()) => self.scan_number(pos),
                '"' => self.scan_string(pos)?,
                '`' => self.scan_raw_string(pos)?,
                '\'' => self.scan_char(pos)?,
                _ => self.scan_operator(pos)?,
            }
        }
        let pos = self.pos();
        self.maybe_insert_semi(pos);
        self.push(TokKind::Eof, pos);
        Ok((self.tokens, self.comments))
    }

    fn scan_line_comment(&mut self, pos: Pos) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.comments.push(Comment { pos, text });
    }

    fn scan_block_comment(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        let mut text = String::new();
        text.push(self.bump().unwrap()); // '/'
        text.push(self.bump().unwrap()); // '*'
        loop {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    text.push('*');
                    text.push(self.bump().unwrap());
                    break;
                }
                Some(c) => text.push(c),
                None => return Err(SyntaxError::new(pos, "unterminated block comment")),
            }
        }
        // A multi-line block comment acts as a newline for semicolon insertion.
        if text.contains('\n') {
            self.maybe_insert_semi(pos);
        }
        self.comments.push(Comment { pos, text });
        Ok(())
    }

    fn scan_ident(&mut self, pos: Pos) {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match name.as_str() {
            "package" => TokKind::Package,
            "import" => TokKind::Import,
            "func" => TokKind::Func,
            "var" => TokKind::Var,
            "const" => TokKind::Const,
            "type" => TokKind::Type,
            "return" => TokKind::Return,
            "if" => TokKind::If,
            "else" => TokKind::Else,
            "for" => TokKind::For,
            "range" => TokKind::Range,
            "switch" => TokKind::Switch,
            "case" => TokKind::Case,
            "default" => TokKind::Default,
            "break" => TokKind::Break,
            "continue" => TokKind::Continue,
            "go" => TokKind::Go,
            "defer" => TokKind::Defer,
            "struct" => TokKind::Struct,
            "map" => TokKind::Map,
            "interface" => TokKind::Interface,
            "fallthrough" => TokKind::Fallthrough,
            _ => TokKind::Ident(name),
        };
        self.push(kind, pos);
    }

    fn scan_number(&mut self, pos: Pos) {
        let mut text = String::new();
        let mut is_float = false;
        if self.peek() == Some('0') && matches!(self.peek2(), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O')) {
            text.push(self.bump().unwrap());
            text.push(self.bump().unwrap());
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() || c == '_' {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        } else {
            while let Some(c) = self.peek() {
                match c {
                    '0'..='9' | '_' => {
                        text.push(c);
                        self.bump();
                    }
                    '.' if !is_float && self.peek2() != Some('.') => {
                        is_float = true;
                        text.push(c);
                        self.bump();
                    }
                    'e' | 'E' => {
                        is_float = true;
                        text.push(c);
                        self.bump();
                        if matches!(self.peek(), Some('+' | '-')) {
                            text.push(self.bump().unwrap());
                        }
                    }
                    _ => break,
                }
            }
        }
        if self.peek() == Some('i') {
            text.push(self.bump().unwrap());
            self.push(TokKind::Imag(text), pos);
        } else if is_float {
            self.push(TokKind::Float(text), pos);
        } else {
            self.push(TokKind::Int(text), pos);
        }
    }

    fn scan_string(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        let mut text = String::new();
        text.push(self.bump().unwrap()); // opening quote
        loop {
            match self.bump() {
                Some('"') => {
                    text.push('"');
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(SyntaxError::new(pos, "unterminated string literal")),
                    }
                }
                Some('\n') | None => {
                    return Err(SyntaxError::new(pos, "unterminated string literal"))
                }
                Some(c) => text.push(c),
            }
        }
        self.push(TokKind::Str(text), pos);
        Ok(())
    }

    fn scan_raw_string(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        let mut text = String::new();
        text.push(self.bump().unwrap()); // opening backquote
        loop {
            match self.bump() {
                Some('`') => {
                    text.push('`');
                    break;
                }
                Some(c) => text.push(c),
                None => return Err(SyntaxError::new(pos, "unterminated raw string literal")),
            }
        }
        self.push(TokKind::Str(text), pos);
        Ok(())
    }

    fn scan_char(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        let mut text = String::new();
        text.push(self.bump().unwrap()); // opening quote
        loop {
            match self.bump() {
                Some('\'') => {
                    text.push('\'');
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    match self.bump() {
                        Some(c) => text.push(c),
                        None => return Err(SyntaxError::new(pos, "unterminated rune literal")),
                    }
                }
                Some(c) => text.push(c),
                None => return Err(SyntaxError::new(pos, "unterminated rune literal")),
            }
        }
        self.push(TokKind::Char(text), pos);
        Ok(())
    }

    fn scan_operator(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        let c = self.bump().unwrap();
        let next = self.peek();
        let kind = match (c, next) {
            ('(', _) => TokKind::LParen,
            (')', _) => TokKind::RParen,
            ('{', _) => TokKind::LBrace,
            ('}', _) => TokKind::RBrace,
            ('[', _) => TokKind::LBrack,
            (']', _) => TokKind::RBrack,
            (',', _) => TokKind::Comma,
            (';', _) => TokKind::Semi,
            ('.', Some('.')) => {
                self.bump();
                if self.peek() == Some('.') {
                    self.bump();
                    TokKind::Ellipsis
                } else {
                    return Err(SyntaxError::new(pos, "unexpected '..'"));
                }
            }
            ('.', _) => TokKind::Dot,
            (':', Some('=')) => {
                self.bump();
                TokKind::Define
            }
            (':', _) => TokKind::Colon,
            ('=', Some('=')) => {
                self.bump();
                TokKind::EqEq
            }
            ('=', _) => TokKind::Assign,
            ('!', Some('=')) => {
                self.bump();
                TokKind::NotEq
            }
            ('!', _) => TokKind::Not,
            ('+', Some('+')) => {
                self.bump();
                TokKind::Inc
            }
            ('+', Some('=')) => {
                self.bump();
                TokKind::PlusEq
            }
            ('+', _) => TokKind::Plus,
            ('-', Some('-')) => {
                self.bump();
                TokKind::Dec
            }
            ('-', Some('=')) => {
                self.bump();
                TokKind::MinusEq
            }
            ('-', _) => TokKind::Minus,
            ('*', Some('=')) => {
                self.bump();
                TokKind::StarEq
            }
            ('*', _) => TokKind::Star,
            ('/', Some('=')) => {
                self.bump();
                TokKind::SlashEq
            }
            ('/', _) => TokKind::Slash,
            ('%', Some('=')) => {
                self.bump();
                TokKind::PercentEq
            }
            ('%', _) => TokKind::Percent,
            ('&', Some('&')) => {
                self.bump();
                TokKind::AndAnd
            }
            ('&', Some('^')) => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::AmpCaretEq
                } else {
                    TokKind::AmpCaret
                }
            }
            ('&', Some('=')) => {
                self.bump();
                TokKind::AmpEq
            }
            ('&', _) => TokKind::Amp,
            ('|', Some('|')) => {
                self.bump();
                TokKind::OrOr
            }
            ('|', Some('=')) => {
                self.bump();
                TokKind::PipeEq
            }
            ('|', _) => TokKind::Pipe,
            ('^', Some('=')) => {
                self.bump();
                TokKind::CaretEq
            }
            ('^', _) => TokKind::Caret,
            ('<', Some('<')) => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::ShlEq
                } else {
                    TokKind::Shl
                }
            }
            ('<', Some('=')) => {
                self.bump();
                TokKind::Le
            }
            ('<', _) => TokKind::Lt,
            ('>', Some('>')) => {
                self.bump();
                if self.peek() == Some('=') {
                    self.bump();
                    TokKind::ShrEq
                } else {
                    TokKind::Shr
                }
            }
            ('>', Some('=')) => {
                self.bump();
                TokKind::Ge
            }
            ('>', _) => TokKind::Gt,
            _ => {
                return Err(SyntaxError::new(pos, format!("unexpected character {c:?}")));
            }
        };
        self.push(kind, pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokKind> {
        let (tokens, _) = scan(source).unwrap();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_semicolon_inserted_after_ident() {
        let kinds = kinds("x\ny");
        assert_eq!(
            kinds,
            vec![
                TokKind::Ident("x".to_string()),
                TokKind::Semi,
                TokKind::Ident("y".to_string()),
                TokKind::Semi,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let kinds = kinds("x +\ny");
        assert_eq!(
            kinds,
            vec![
                TokKind::Ident("x".to_string()),
                TokKind::Plus,
                TokKind::Ident("y".to_string()),
                TokKind::Semi,
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn test_semicolon_after_close_brace() {
        let kinds = kinds("}\n");
        assert_eq!(kinds, vec![TokKind::RBrace, TokKind::Semi, TokKind::Eof]);
    }

    #[test]
    fn test_line_comment_captured() {
        let (tokens, comments) = scan("x // trailing\ny").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "// trailing");
        // Semicolon still inserted for the newline ending the comment.
        assert!(tokens.iter().any(|t| t.kind == TokKind::Semi));
    }

    #[test]
    fn test_string_with_escapes() {
        let kinds = kinds(r#""a\"b""#);
        assert_eq!(kinds[0], TokKind::Str(r#""a\"b""#.to_string()));
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let (tokens, _) = scan("`a\nb`").unwrap();
        assert_eq!(tokens[0].kind, TokKind::Str("`a\nb`".to_string()));
    }

    #[test]
    fn test_define_and_compound_ops() {
        let kinds = kinds("a := b &^= c <<= d");
        assert!(kinds.contains(&TokKind::Define));
        assert!(kinds.contains(&TokKind::AmpCaretEq));
        assert!(kinds.contains(&TokKind::ShlEq));
    }

    #[test]
    fn test_numbers() {
        let kinds = kinds("1 0x2f 3.14 1e9 2i");
        assert_eq!(kinds[0], TokKind::Int("1".to_string()));
        assert_eq!(kinds[1], TokKind::Int("0x2f".to_string()));
        assert_eq!(kinds[2], TokKind::Float("3.14".to_string()));
        assert_eq!(kinds[3], TokKind::Float("1e9".to_string()));
        assert_eq!(kinds[4], TokKind::Imag("2i".to_string()));
    }
}
