//! Program loading.
//!
//! Turns source file paths (or glob patterns) into a fully resolved
//! [`Program`]: per-package scopes of declared type names, a resolved type
//! for every identifier and constant, and a position index over doc
//! comments. The mapping engine consumes only this interface; everything
//! syntactic stays behind it.

pub mod lexer;
pub mod parser;
mod resolve;

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::error::LoadError;
use crate::types::{Constant, NamedId, Pos, TypeId, TypeTable};
use parser::DocEntry;

/// A declared package-level type name.
#[derive(Debug, Clone)]
pub struct TypeNameObj {
    pub name: String,
    pub named: NamedId,
    /// The unique `Type::Named` id references to this name resolve to.
    pub ty: TypeId,
    pub pos: Pos,
    pub line: u32,
    pub exported: bool,
}

/// One package's declared top-level names, in declaration order.
#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub scope: Vec<TypeNameObj>,
    by_name: HashMap<String, usize>,
}

impl Package {
    pub fn lookup(&self, name: &str) -> Option<&TypeNameObj> {
        self.by_name.get(name).map(|i| &self.scope[*i])
    }
}

/// A loaded, fully resolved program.
#[derive(Debug)]
pub struct Program {
    /// Source paths; `Pos::file` indexes into this.
    pub files: Vec<String>,
    pub packages: Vec<Package>,
    pub types: TypeTable,
    /// Every explicitly typed package-level constant, in encounter order
    /// across all files.
    pub constants: Vec<Constant>,
    docs: Vec<Vec<DocEntry>>,
}

impl Program {
    /// Trimmed leading documentation of the innermost field or general
    /// declaration enclosing `pos`, or the empty string.
    pub fn doc_at(&self, pos: Pos) -> String {
        let Some(entries) = self.docs.get(pos.file as usize) else {
            return String::new();
        };
        entries
            .iter()
            .filter(|e| e.span.contains(pos.offset))
            .min_by_key(|e| e.span.len())
            .map(|e| e.doc.trim().to_string())
            .unwrap_or_default()
    }
}

/// Load from CLI-style arguments: literal paths and quoted glob patterns.
pub fn load_args<S: AsRef<str>>(args: &[S]) -> Result<Program, LoadError> {
    let paths = resolve_path_patterns(args)?;
    debug!(files = paths.len(), "loading sources");
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        sources.push((path.display().to_string(), text));
    }
    load_sources(sources)
}

/// Load from already-read `(path, text)` pairs.
pub fn load_sources(sources: Vec<(String, String)>) -> Result<Program, LoadError> {
    let mut files = Vec::with_capacity(sources.len());
    for (path, text) in &sources {
        let scanned = lexer::scan(path, text)?;
        files.push(parser::parse(path, scanned)?);
    }
    let program = resolve::resolve(files)?;
    debug!(
        packages = program.packages.len(),
        constants = program.constants.len(),
        "resolved program"
    );
    Ok(program)
}

fn resolve_path_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, LoadError> {
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            let entries = glob::glob(pattern).map_err(|source| LoadError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            for entry in entries {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                // an explicit glob matching nothing is an error, not an
                // empty program
                return Err(LoadError::NoMatch(pattern.to_string()));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
