//! Declaration parser.
//!
//! Recursive descent over the scanned token stream, covering the subset the
//! schema generator consumes: the package clause, `type` and `const`
//! declarations (single and grouped), and the type grammar reachable from
//! them. `import`, `var`, and `func` declarations are skipped by balanced
//! token matching. Doc comments are attached to fields and to whole general
//! declarations, which is exactly the set the documentation lookup honors.

use crate::error::LoadError;
use super::lexer::{Comment, Keyword, Scanned, Span, Token, TokenKind};

#[derive(Debug)]
pub struct SourceFile {
    pub path: String,
    pub package: String,
    pub decls: Vec<Decl>,
    pub doc_entries: Vec<DocEntry>,
}

/// One entry of the position index: the covered source range of a field or
/// general declaration, and its leading documentation (possibly empty).
#[derive(Debug, Clone)]
pub struct DocEntry {
    pub span: Span,
    pub doc: String,
}

#[derive(Debug)]
pub enum Decl {
    Type(Vec<TypeSpec>),
    Const(Vec<ConstSpec>),
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug)]
pub struct TypeSpec {
    pub name: Ident,
    pub expr: TypeExpr,
}

/// One constant specification line. Empty `values` with no type means the
/// spec repeats the previous one (with `iota` advanced), per Go's
/// omitted-expression rule; the resolver applies that.
#[derive(Debug)]
pub struct ConstSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<ConstExpr>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum ConstExpr {
    Iota,
    Bool(bool),
    Int(u64),
    Float(f64),
    Imag,
    Rune(char),
    Str(String),
    Neg(Box<ConstExpr>),
}

#[derive(Debug)]
pub enum TypeExpr {
    Name(Ident),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// Fixed-length array; a literal length is kept for diagnostics.
    Array(Option<u64>, Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Struct(Vec<FieldDecl>),
    Chan(Box<TypeExpr>),
    Func,
    Interface,
}

#[derive(Debug)]
pub struct FieldDecl {
    /// Declared names; empty for an embedded field.
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    /// Raw backtick tag content.
    pub tag: Option<String>,
    pub embedded: bool,
    pub span: Span,
    pub line: u32,
}

pub fn parse(path: &str, scanned: Scanned) -> Result<SourceFile, LoadError> {
    Parser {
        path,
        toks: scanned.tokens,
        pos: 0,
        groups: doc_groups(&scanned.comments),
        doc_entries: Vec::new(),
    }
    .run()
}

/// A run of contiguous line-leading comments, joined.
struct DocGroup {
    end_line: u32,
    text: String,
}

fn doc_groups(comments: &[Comment]) -> Vec<DocGroup> {
    let mut groups: Vec<DocGroup> = Vec::new();
    let mut open: Option<DocGroup> = None;
    for c in comments {
        if !c.leads_line {
            // a trailing comment terminates any open group
            groups.extend(open.take());
            continue;
        }
        match &mut open {
            Some(group) if c.start_line == group.end_line + 1 => {
                group.text.push('\n');
                group.text.push_str(&c.text);
                group.end_line = c.end_line;
            }
            _ => {
                groups.extend(open.take());
                open = Some(DocGroup {
                    end_line: c.end_line,
                    text: c.text.clone(),
                });
            }
        }
    }
    groups.extend(open);
    groups
}

struct Parser<'a> {
    path: &'a str,
    toks: Vec<Token>,
    pos: usize,
    groups: Vec<DocGroup>,
    doc_entries: Vec<DocEntry>,
}

impl Parser<'_> {
    fn run(mut self) -> Result<SourceFile, LoadError> {
        self.expect_keyword(Keyword::Package)?;
        let package = self.ident()?;
        self.expect_semi()?;

        let mut decls = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::Semi => self.pos += 1,
                TokenKind::Keyword(Keyword::Import | Keyword::Var | Keyword::Func) => {
                    self.pos += 1;
                    self.skip_decl();
                }
                TokenKind::Keyword(Keyword::Type) => decls.push(self.type_decl()?),
                TokenKind::Keyword(Keyword::Const) => decls.push(self.const_decl()?),
                _ => return Err(self.err("unexpected token at top level")),
            }
        }

        Ok(SourceFile {
            path: self.path.to_string(),
            package: package.name,
            decls,
            doc_entries: self.doc_entries,
        })
    }

    // ---------------------------- cursor ---------------------------- //

    fn cur(&self) -> &Token {
        &self.toks[self.pos]
    }

    fn kind(&self) -> &TokenKind {
        &self.cur().kind
    }

    fn prev_end(&self) -> u32 {
        self.toks[self.pos.saturating_sub(1)].span.end
    }

    fn err(&self, message: impl Into<String>) -> LoadError {
        LoadError::Syntax {
            file: self.path.to_string(),
            line: self.cur().line,
            message: message.into(),
        }
    }

    fn at_punct(&self, c: char) -> bool {
        matches!(self.kind(), TokenKind::Punct(p) if *p == c)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), LoadError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.err(format!("expected `{c}`")))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), LoadError> {
        match self.kind() {
            TokenKind::Keyword(k) if *k == kw => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.err(format!("expected `{kw:?}` keyword").to_lowercase())),
        }
    }

    fn expect_semi(&mut self) -> Result<(), LoadError> {
        match self.kind() {
            TokenKind::Semi => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.err("expected newline or `;`")),
        }
    }

    fn skip_semis(&mut self) {
        while matches!(self.kind(), TokenKind::Semi) {
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> Result<Ident, LoadError> {
        match self.kind() {
            TokenKind::Ident(name) => {
                let id = Ident {
                    name: name.clone(),
                    span: self.cur().span,
                    line: self.cur().line,
                };
                self.pos += 1;
                Ok(id)
            }
            _ => Err(self.err("expected identifier")),
        }
    }

    /// `name` or `pkg.name`, joined with the dot.
    fn qualified_ident(&mut self) -> Result<Ident, LoadError> {
        let first = self.ident()?;
        if !self.eat_punct('.') {
            return Ok(first);
        }
        let sel = self.ident()?;
        Ok(Ident {
            name: format!("{}.{}", first.name, sel.name),
            span: Span::new(first.span.start, sel.span.end),
            line: first.line,
        })
    }

    fn doc_above(&self, line: u32) -> String {
        self.groups
            .iter()
            .rev()
            .find(|g| g.end_line + 1 == line)
            .map(|g| g.text.clone())
            .unwrap_or_default()
    }

    // ------------------------- declarations -------------------------- //

    /// Consume the remainder of an `import`/`var`/`func` declaration: every
    /// token up to the terminating semicolon at zero bracket depth.
    fn skip_decl(&mut self) {
        let mut depth = 0i64;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::Semi if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                TokenKind::Punct('(' | '[' | '{') => {
                    depth += 1;
                    self.pos += 1;
                }
                TokenKind::Punct(')' | ']' | '}') => {
                    depth -= 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Consume tokens until the matching `close` for an already-consumed
    /// `open`, tracking nesting of that bracket pair.
    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), LoadError> {
        let mut depth = 1u32;
        loop {
            match self.kind() {
                TokenKind::Eof => return Err(self.err(format!("missing `{close}`"))),
                TokenKind::Punct(p) if *p == open => depth += 1,
                TokenKind::Punct(p) if *p == close => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Separator between specs or fields in a braced/parenthesized list:
    /// a semicolon, or nothing right before the closing delimiter.
    fn list_separator(&mut self, close: char) -> Result<(), LoadError> {
        if self.at_punct(close) {
            return Ok(());
        }
        self.expect_semi()?;
        self.skip_semis();
        Ok(())
    }

    fn type_decl(&mut self) -> Result<Decl, LoadError> {
        let start = self.cur().span.start;
        let doc = self.doc_above(self.cur().line);
        self.pos += 1; // `type`

        let mut specs = Vec::new();
        if self.eat_punct('(') {
            self.skip_semis();
            while !self.at_punct(')') {
                specs.push(self.type_spec()?);
                self.list_separator(')')?;
            }
            self.expect_punct(')')?;
        } else {
            specs.push(self.type_spec()?);
        }

        self.doc_entries.push(DocEntry {
            span: Span::new(start, self.prev_end()),
            doc,
        });
        Ok(Decl::Type(specs))
    }

    fn type_spec(&mut self) -> Result<TypeSpec, LoadError> {
        let name = self.ident()?;
        // `type A = B` aliases are treated as ordinary definitions
        self.eat_punct('=');
        let expr = self.type_expr()?;
        Ok(TypeSpec { name, expr })
    }

    fn const_decl(&mut self) -> Result<Decl, LoadError> {
        let start = self.cur().span.start;
        let doc = self.doc_above(self.cur().line);
        self.pos += 1; // `const`

        let mut specs = Vec::new();
        if self.eat_punct('(') {
            self.skip_semis();
            while !self.at_punct(')') {
                specs.push(self.const_spec()?);
                self.list_separator(')')?;
            }
            self.expect_punct(')')?;
        } else {
            specs.push(self.const_spec()?);
        }

        self.doc_entries.push(DocEntry {
            span: Span::new(start, self.prev_end()),
            doc,
        });
        Ok(Decl::Const(specs))
    }

    fn const_spec(&mut self) -> Result<ConstSpec, LoadError> {
        let line = self.cur().line;
        let mut names = vec![self.ident()?];
        while self.eat_punct(',') {
            names.push(self.ident()?);
        }

        let mut ty = None;
        let mut values = Vec::new();
        if !matches!(self.kind(), TokenKind::Semi) && !self.at_punct(')') {
            if !self.eat_punct('=') {
                ty = Some(self.type_expr()?);
                self.expect_punct('=')?;
            }
            values.push(self.const_expr()?);
            while self.eat_punct(',') {
                values.push(self.const_expr()?);
            }
        }

        Ok(ConstSpec {
            names,
            ty,
            values,
            line,
        })
    }

    fn const_expr(&mut self) -> Result<ConstExpr, LoadError> {
        let expr = match self.kind() {
            TokenKind::Ident(name) => match name.as_str() {
                "iota" => ConstExpr::Iota,
                "true" => ConstExpr::Bool(true),
                "false" => ConstExpr::Bool(false),
                _ => return Err(self.err(format!("unsupported constant expression: {name}"))),
            },
            TokenKind::Int(v) => ConstExpr::Int(*v),
            TokenKind::Float(v) => ConstExpr::Float(*v),
            TokenKind::Imag => ConstExpr::Imag,
            TokenKind::Rune(c) => ConstExpr::Rune(*c),
            TokenKind::Str(s) => ConstExpr::Str(s.clone()),
            TokenKind::Punct('-') => {
                self.pos += 1;
                return Ok(ConstExpr::Neg(Box::new(self.const_expr()?)));
            }
            TokenKind::Punct('+') => {
                self.pos += 1;
                return self.const_expr();
            }
            TokenKind::Punct('(') => {
                self.pos += 1;
                let inner = self.const_expr()?;
                self.expect_punct(')')?;
                return Ok(inner);
            }
            _ => return Err(self.err("unsupported constant expression")),
        };
        self.pos += 1;
        Ok(expr)
    }

    // ----------------------------- types ----------------------------- //

    fn type_expr(&mut self) -> Result<TypeExpr, LoadError> {
        match self.kind() {
            TokenKind::Punct('*') => {
                self.pos += 1;
                Ok(TypeExpr::Pointer(Box::new(self.type_expr()?)))
            }
            TokenKind::Punct('[') => {
                self.pos += 1;
                if self.eat_punct(']') {
                    return Ok(TypeExpr::Slice(Box::new(self.type_expr()?)));
                }
                let len = self.array_len()?;
                Ok(TypeExpr::Array(len, Box::new(self.type_expr()?)))
            }
            TokenKind::Punct('(') => {
                self.pos += 1;
                let inner = self.type_expr()?;
                self.expect_punct(')')?;
                Ok(inner)
            }
            TokenKind::Keyword(Keyword::Map) => {
                self.pos += 1;
                self.expect_punct('[')?;
                let key = self.type_expr()?;
                self.expect_punct(']')?;
                let value = self.type_expr()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            TokenKind::Keyword(Keyword::Struct) => self.struct_type(),
            TokenKind::Keyword(Keyword::Chan) => {
                self.pos += 1;
                if self.eat_punct('<') {
                    self.expect_punct('-')?;
                }
                Ok(TypeExpr::Chan(Box::new(self.type_expr()?)))
            }
            TokenKind::Punct('<') => {
                // receive-only channel: `<-chan T`
                self.pos += 1;
                self.expect_punct('-')?;
                self.expect_keyword(Keyword::Chan)?;
                Ok(TypeExpr::Chan(Box::new(self.type_expr()?)))
            }
            TokenKind::Keyword(Keyword::Func) => {
                self.pos += 1;
                self.func_signature()?;
                Ok(TypeExpr::Func)
            }
            TokenKind::Keyword(Keyword::Interface) => {
                self.pos += 1;
                self.expect_punct('{')?;
                self.skip_balanced('{', '}')?;
                Ok(TypeExpr::Interface)
            }
            TokenKind::Ident(_) => Ok(TypeExpr::Name(self.qualified_ident()?)),
            _ => Err(self.err("expected type")),
        }
    }

    /// Array length expression. A literal length is captured for
    /// diagnostics; anything else is skipped to the closing bracket.
    fn array_len(&mut self) -> Result<Option<u64>, LoadError> {
        if let TokenKind::Int(v) = self.kind() {
            let v = *v;
            if matches!(self.toks.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Punct(']'))) {
                self.pos += 2;
                return Ok(Some(v));
            }
        }
        self.skip_balanced('[', ']')?;
        Ok(None)
    }

    /// Skip a function signature: the parameter list plus an optional
    /// result (parenthesized list or a single type).
    fn func_signature(&mut self) -> Result<(), LoadError> {
        self.expect_punct('(')?;
        self.skip_balanced('(', ')')?;
        if self.at_punct('(') {
            self.pos += 1;
            self.skip_balanced('(', ')')?;
            return Ok(());
        }
        let starts_type = matches!(
            self.kind(),
            TokenKind::Ident(_)
                | TokenKind::Punct('*' | '[' | '<')
                | TokenKind::Keyword(
                    Keyword::Map | Keyword::Chan | Keyword::Struct | Keyword::Interface | Keyword::Func
                )
        );
        if starts_type {
            self.type_expr()?;
        }
        Ok(())
    }

    fn struct_type(&mut self) -> Result<TypeExpr, LoadError> {
        self.pos += 1; // `struct`
        self.expect_punct('{')?;
        self.skip_semis();
        let mut fields = Vec::new();
        while !self.at_punct('}') {
            fields.push(self.field_decl()?);
            self.list_separator('}')?;
        }
        self.expect_punct('}')?;
        Ok(TypeExpr::Struct(fields))
    }

    fn field_decl(&mut self) -> Result<FieldDecl, LoadError> {
        let start = self.cur().span.start;
        let line = self.cur().line;
        let doc = self.doc_above(line);

        let (names, ty, embedded) = match self.kind() {
            TokenKind::Punct('*') => {
                self.pos += 1;
                let id = self.qualified_ident()?;
                (
                    Vec::new(),
                    TypeExpr::Pointer(Box::new(TypeExpr::Name(id))),
                    true,
                )
            }
            TokenKind::Ident(_) => {
                let first = self.ident()?;
                match self.kind() {
                    TokenKind::Punct(',') => {
                        let mut names = vec![first];
                        while self.eat_punct(',') {
                            names.push(self.ident()?);
                        }
                        let ty = self.type_expr()?;
                        (names, ty, false)
                    }
                    TokenKind::Punct('.') => {
                        self.pos += 1;
                        let sel = self.ident()?;
                        let id = Ident {
                            name: format!("{}.{}", first.name, sel.name),
                            span: Span::new(first.span.start, sel.span.end),
                            line: first.line,
                        };
                        (Vec::new(), TypeExpr::Name(id), true)
                    }
                    TokenKind::Semi | TokenKind::Str(_) | TokenKind::Punct('}') => {
                        (Vec::new(), TypeExpr::Name(first), true)
                    }
                    _ => {
                        let ty = self.type_expr()?;
                        (vec![first], ty, false)
                    }
                }
            }
            _ => return Err(self.err("expected field declaration")),
        };

        let tag = match self.kind() {
            TokenKind::Str(s) => {
                let s = s.clone();
                self.pos += 1;
                Some(s)
            }
            _ => None,
        };

        let span = Span::new(start, self.prev_end());
        self.doc_entries.push(DocEntry {
            span,
            doc,
        });
        Ok(FieldDecl {
            names,
            ty,
            tag,
            embedded,
            span,
            line,
        })
    }
}
