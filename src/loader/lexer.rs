//! Go token scanner with source spans.
//!
//! Produces the token stream the declaration parser consumes, applying Go's
//! automatic semicolon insertion so the parser can treat line ends
//! uniformly. Comments are collected to the side with enough position
//! information to attach doc comments to declarations later.

use crate::error::LoadError;

/// Byte-offset range within one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Keywords the declaration grammar dispatches on. Everything else
/// (including `return`, `if`, ...) scans as an identifier, which matches
/// how those behave for semicolon insertion in the subset we parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Package,
    Import,
    Type,
    Struct,
    Map,
    Chan,
    Interface,
    Func,
    Const,
    Var,
}

fn keyword(ident: &str) -> Option<Keyword> {
    Some(match ident {
        "package" => Keyword::Package,
        "import" => Keyword::Import,
        "type" => Keyword::Type,
        "struct" => Keyword::Struct,
        "map" => Keyword::Map,
        "chan" => Keyword::Chan,
        "interface" => Keyword::Interface,
        "func" => Keyword::Func,
        "const" => Keyword::Const,
        "var" => Keyword::Var,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    Int(u64),
    Float(f64),
    /// Imaginary literal; the value is never consumed downstream.
    Imag,
    Rune(char),
    /// Cooked string literal, interpreted or raw.
    Str(String),
    Punct(char),
    /// Explicit `;` or one inserted at a line end.
    Semi,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
}

/// A single comment, already stripped of its `//` or `/* */` markers.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
    /// True when no token precedes the comment on its starting line;
    /// only such comments can contribute to a doc group.
    pub leads_line: bool,
}

#[derive(Debug)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

pub fn scan(path: &str, src: &str) -> Result<Scanned, LoadError> {
    Lexer {
        path,
        src,
        pos: 0,
        line: 1,
        line_has_token: false,
        tokens: Vec::new(),
        comments: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    path: &'a str,
    src: &'a str,
    pos: usize,
    line: u32,
    line_has_token: bool,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Scanned, LoadError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            let start_line = self.line;
            match c {
                '\n' => {
                    self.bump();
                    self.line_break();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(start_line),
                '/' if self.peek_at(1) == Some('*') => self.block_comment(start, start_line)?,
                '`' => self.raw_string(start, start_line)?,
                '"' => self.interpreted_string(start, start_line)?,
                '\'' => self.rune(start, start_line)?,
                c if c.is_alphabetic() || c == '_' => self.ident(start, start_line),
                c if c.is_ascii_digit() => self.number(start, start_line)?,
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.number(start, start_line)?
                }
                ';' => {
                    self.bump();
                    self.push(TokenKind::Semi, start, start_line);
                }
                c => {
                    self.bump();
                    self.push(TokenKind::Punct(c), start, start_line);
                }
            }
        }

        if self.semi_eligible() {
            self.push(TokenKind::Semi, self.pos, self.line);
        }
        self.push(TokenKind::Eof, self.pos, self.line);

        Ok(Scanned {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    // ---------------------------- cursor ---------------------------- //

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: u32) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start as u32, self.pos as u32),
            line,
        });
        self.line_has_token = true;
    }

    fn err(&self, line: u32, message: impl Into<String>) -> LoadError {
        LoadError::Syntax {
            file: self.path.to_string(),
            line,
            message: message.into(),
        }
    }

    // ----------------------- semicolon insertion --------------------- //

    fn semi_eligible(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            Some(
                TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Imag
                | TokenKind::Rune(_)
                | TokenKind::Str(_),
            ) => true,
            Some(TokenKind::Punct(c)) => matches!(c, ')' | ']' | '}'),
            _ => false,
        }
    }

    fn line_break(&mut self) {
        if self.semi_eligible() {
            self.tokens.push(Token {
                kind: TokenKind::Semi,
                span: Span::new(self.pos as u32, self.pos as u32),
                line: self.line,
            });
        }
        self.line += 1;
        self.line_has_token = false;
    }

    // ----------------------------- comments -------------------------- //

    fn line_comment(&mut self, start_line: u32) {
        let leads_line = !self.line_has_token;
        self.bump();
        self.bump();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text = &self.src[start..self.pos];
        let text = text.strip_prefix(' ').unwrap_or(text);
        self.comments.push(Comment {
            text: text.to_string(),
            start_line,
            end_line: start_line,
            leads_line,
        });
    }

    fn block_comment(&mut self, start: usize, start_line: u32) -> Result<(), LoadError> {
        let leads_line = !self.line_has_token;
        self.bump();
        self.bump();
        let body_start = self.pos;
        let mut newlines = 0u32;
        loop {
            match self.peek() {
                None => return Err(self.err(start_line, "unterminated block comment")),
                Some('*') if self.peek_at(1) == Some('/') => break,
                Some(c) => {
                    if c == '\n' {
                        newlines += 1;
                    }
                    self.bump();
                }
            }
        }
        let text = self.src[body_start..self.pos].trim().to_string();
        self.bump();
        self.bump();
        self.comments.push(Comment {
            text,
            start_line,
            end_line: start_line + newlines,
            leads_line,
        });
        // a comment spanning lines acts like a line end
        if newlines > 0 {
            if self.semi_eligible() {
                self.tokens.push(Token {
                    kind: TokenKind::Semi,
                    span: Span::new(start as u32, start as u32),
                    line: start_line,
                });
            }
            self.line += newlines;
            self.line_has_token = false;
        }
        Ok(())
    }

    // ----------------------------- tokens ---------------------------- //

    fn ident(&mut self, start: usize, start_line: u32) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        let kind = match keyword(text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident(text.to_string()),
        };
        self.push(kind, start, start_line);
    }

    fn number(&mut self, start: usize, start_line: u32) -> Result<(), LoadError> {
        let mut raw = String::new();
        let mut is_hex = false;
        loop {
            let Some(c) = self.peek() else { break };
            let after_exp = matches!(raw.chars().last(), Some('e' | 'E')) && !is_hex
                || matches!(raw.chars().last(), Some('p' | 'P')) && is_hex;
            let ok = c.is_ascii_alphanumeric()
                || c == '_'
                || c == '.'
                || ((c == '+' || c == '-') && after_exp);
            if !ok {
                break;
            }
            raw.push(c);
            self.bump();
            if raw == "0x" || raw == "0X" {
                is_hex = true;
            }
        }

        let clean: String = raw.chars().filter(|c| *c != '_').collect();
        let kind = self.classify_number(&clean, is_hex, start_line)?;
        self.push(kind, start, start_line);
        Ok(())
    }

    fn classify_number(
        &self,
        clean: &str,
        is_hex: bool,
        line: u32,
    ) -> Result<TokenKind, LoadError> {
        if clean.ends_with('i') {
            return Ok(TokenKind::Imag);
        }
        let int = |digits: &str, radix: u32| {
            u64::from_str_radix(digits, radix)
                .map(TokenKind::Int)
                .map_err(|_| self.err(line, format!("invalid integer literal: {clean}")))
        };
        if is_hex {
            let digits = &clean[2..];
            if digits.contains(['.', 'p', 'P']) {
                return Err(self.err(line, "hexadecimal float literals are not supported"));
            }
            return int(digits, 16);
        }
        if let Some(digits) = clean.strip_prefix("0b").or_else(|| clean.strip_prefix("0B")) {
            return int(digits, 2);
        }
        if let Some(digits) = clean.strip_prefix("0o").or_else(|| clean.strip_prefix("0O")) {
            return int(digits, 8);
        }
        if clean.contains(['.', 'e', 'E']) {
            return clean
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.err(line, format!("invalid float literal: {clean}")));
        }
        if clean.len() > 1 && clean.starts_with('0') {
            return int(&clean[1..], 8);
        }
        int(clean, 10)
    }

    fn raw_string(&mut self, start: usize, start_line: u32) -> Result<(), LoadError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err(start_line, "unterminated raw string literal")),
                Some('`') => break,
                Some('\r') => {}
                Some('\n') => {
                    value.push('\n');
                    self.line += 1;
                }
                Some(c) => value.push(c),
            }
        }
        self.push(TokenKind::Str(value), start, start_line);
        Ok(())
    }

    fn interpreted_string(&mut self, start: usize, start_line: u32) -> Result<(), LoadError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.err(start_line, "unterminated string literal"));
                }
                Some('"') => break,
                Some('\\') => value.push(self.escape(start_line)?),
                Some(c) => value.push(c),
            }
        }
        self.push(TokenKind::Str(value), start, start_line);
        Ok(())
    }

    fn rune(&mut self, start: usize, start_line: u32) -> Result<(), LoadError> {
        self.bump();
        let c = match self.bump() {
            None | Some('\n') => return Err(self.err(start_line, "unterminated rune literal")),
            Some('\\') => self.escape(start_line)?,
            Some(c) => c,
        };
        if self.bump() != Some('\'') {
            return Err(self.err(start_line, "unterminated rune literal"));
        }
        self.push(TokenKind::Rune(c), start, start_line);
        Ok(())
    }

    fn escape(&mut self, line: u32) -> Result<char, LoadError> {
        let c = self
            .bump()
            .ok_or_else(|| self.err(line, "unterminated escape sequence"))?;
        Ok(match c {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => self.hex_escape(2, line)?,
            'u' => self.hex_escape(4, line)?,
            'U' => self.hex_escape(8, line)?,
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    let d = self
                        .bump()
                        .and_then(|c| c.to_digit(8))
                        .ok_or_else(|| self.err(line, "invalid octal escape"))?;
                    value = value * 8 + d;
                }
                char::from_u32(value).ok_or_else(|| self.err(line, "invalid octal escape"))?
            }
            _ => return Err(self.err(line, format!("unknown escape sequence: \\{c}"))),
        })
    }

    fn hex_escape(&mut self, digits: u32, line: u32) -> Result<char, LoadError> {
        let mut value = 0u32;
        for _ in 0..digits {
            let d = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.err(line, "invalid hex escape"))?;
            value = value * 16 + d;
        }
        char::from_u32(value).ok_or_else(|| self.err(line, "escape is not a valid code point"))
    }
}
