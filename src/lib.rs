//! Generate JSON Schema documents from Go type declarations.
//!
//! Loads Go source files, resolves their top-level declarations, and emits
//! one draft-04 schema document describing the serialized shape of every
//! exported type: structs become objects with tag-driven property names and
//! requiredness, slices become arrays, maps carry their value schema on
//! `additionalProperties`, named types referenced from fields stay `$ref`
//! nodes, and constant groups back string/integer/boolean enums.
//!
//! Generation is fail-fast: an unsupported type category or constant kind
//! aborts the run rather than degrading to a partial document.

pub mod cli;
pub mod error;
pub mod generate;
pub mod loader;
pub mod schema;
pub mod tags;
pub mod types;
