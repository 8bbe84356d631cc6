//! Error taxonomy: loading fails, an unsupported type category fails, an
//! unsupported constant literal fails. All three are terminal; no partial
//! schema document is ever emitted.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The source could not be read, parsed, or resolved.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bad glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("glob pattern matched no files: {0}")]
    NoMatch(String),

    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    #[error("{file}:{line}: {message}")]
    Syntax {
        file: String,
        line: u32,
        message: String,
    },

    #[error("{file}:{line}: undeclared name: {name}")]
    Undeclared {
        file: String,
        line: u32,
        name: String,
    },

    #[error("{file}:{line}: {name} redeclared in package {package}")]
    Redeclared {
        file: String,
        line: u32,
        name: String,
        package: String,
    },
}

/// Generation is fail-fast and all-or-nothing; the first of these aborts
/// the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A channel, function signature, interface, fixed-length array, or
    /// unsupported primitive kind was reached while mapping.
    #[error("unsupported type for schema mapping: {ty} (object `{object}`)")]
    UnsupportedType { ty: String, object: String },

    /// A constant of an unsupported literal kind was found while scanning
    /// an enum group.
    #[error("unsupported constant kind {kind} for enum value `{name}`")]
    UnsupportedLiteral { kind: &'static str, name: String },
}
