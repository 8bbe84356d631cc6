//! Resolved type model.
//!
//! The loader resolves every declaration into this flat arena. Type identity
//! is arena-id identity: each basic kind is interned exactly once and each
//! named type owns exactly one id, so "is this constant's declared type
//! exactly the queried type" is a plain id comparison.

use std::collections::HashMap;
use std::fmt;

/// Source position: owning file index plus byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub file: u32,
    pub offset: u32,
}

/// Handle into [`TypeTable::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// Handle into [`TypeTable::named`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(u32);

/// One resolved type descriptor. Exhaustive by design: every consumer
/// matches all arms, so a new category cannot vanish silently.
#[derive(Debug, Clone)]
pub enum Type {
    Basic(BasicKind),
    Named(NamedId),
    Pointer(TypeId),
    Slice(TypeId),
    /// Fixed-length array; the length is kept for diagnostics only.
    Array(Option<u64>, TypeId),
    Map(TypeId, TypeId),
    Struct(StructType),
    Chan(TypeId),
    Func,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        use BasicKind::*;
        match self {
            Bool => "bool",
            Int => "int",
            Int8 => "int8",
            Int16 => "int16",
            Int32 => "int32",
            Int64 => "int64",
            Uint => "uint",
            Uint8 => "uint8",
            Uint16 => "uint16",
            Uint32 => "uint32",
            Uint64 => "uint64",
            Uintptr => "uintptr",
            Float32 => "float32",
            Float64 => "float64",
            Complex64 => "complex64",
            Complex128 => "complex128",
            String => "string",
            UnsafePointer => "unsafe.Pointer",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct StructType {
    pub fields: Vec<Field>,
}

/// One declared struct field, already expanded (a `A, B int` declaration
/// yields two fields).
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    /// Raw backtick tag content, uninterpreted.
    pub tag: Option<String>,
    pub embedded: bool,
    pub exported: bool,
    pub pos: Pos,
}

/// A type introduced by a declaration giving it an identifier distinct
/// from its underlying structural shape.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    /// Right-hand side of the declaration; invalid until the resolver's
    /// second pass fills it in.
    pub underlying: TypeId,
    pub pos: Pos,
    pub exported: bool,
}

/// A package-level constant with an explicit (or group-inherited)
/// declared type. Untyped constants never match an enum query and are
/// not recorded.
#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub ty: TypeId,
    pub value: ConstLit,
    pub pos: Pos,
}

/// Uninterpreted compile-time value of a constant. Interpretation against
/// the constant's underlying basic kind happens in the enumeration
/// scanner, so an unsupported kind surfaces there, not at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstLit {
    Bool(bool),
    /// Integers and runes, wide enough for every signed and unsigned
    /// 64-bit value.
    Int(i128),
    Float(f64),
    Str(String),
    /// Imaginary literal; carries no value because no consumer can use one.
    Complex,
}

#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
    named: Vec<NamedType>,
    basics: HashMap<BasicKind, TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Interned id for a basic kind; repeated calls return the same id.
    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        if let Some(id) = self.basics.get(&kind) {
            return *id;
        }
        let id = self.alloc(Type::Basic(kind));
        self.basics.insert(kind, id);
        id
    }

    /// Declare a named type with a placeholder underlying type. Returns the
    /// named handle and the (unique) `Type::Named` id references resolve to.
    pub fn declare_named(&mut self, name: String, pos: Pos, exported: bool) -> (NamedId, TypeId) {
        let named_id = NamedId(self.named.len() as u32);
        let placeholder = TypeId(u32::MAX);
        self.named.push(NamedType {
            name,
            underlying: placeholder,
            pos,
            exported,
        });
        let type_id = self.alloc(Type::Named(named_id));
        (named_id, type_id)
    }

    pub fn set_underlying(&mut self, id: NamedId, underlying: TypeId) {
        self.named[id.0 as usize].underlying = underlying;
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn named(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    /// Chase a chain of named types down to the structural type beneath it.
    /// The resolver rejects cyclic chains, so the bound is never hit in a
    /// resolved program.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut cur = id;
        for _ in 0..=self.named.len() {
            match self.get(cur) {
                Type::Named(n) => cur = self.named(*n).underlying,
                _ => return cur,
            }
        }
        cur
    }

    pub fn underlying_basic(&self, id: TypeId) -> Option<BasicKind> {
        match self.get(self.underlying(id)) {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Go-notation rendering for diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Basic(kind) => kind.name().to_string(),
            Type::Named(n) => self.named(*n).name.clone(),
            Type::Pointer(elem) => format!("*{}", self.display(*elem)),
            Type::Slice(elem) => format!("[]{}", self.display(*elem)),
            Type::Array(len, elem) => match len {
                Some(n) => format!("[{}]{}", n, self.display(*elem)),
                None => format!("[...]{}", self.display(*elem)),
            },
            Type::Map(key, value) => {
                format!("map[{}]{}", self.display(*key), self.display(*value))
            }
            Type::Struct(_) => "struct{...}".to_string(),
            Type::Chan(elem) => format!("chan {}", self.display(*elem)),
            Type::Func => "func(...)".to_string(),
            Type::Interface => "interface{...}".to_string(),
        }
    }
}

/// Go visibility rule: a name is exported when its first character is an
/// uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basics_are_interned() {
        let mut table = TypeTable::new();
        let a = table.basic(BasicKind::String);
        let b = table.basic(BasicKind::String);
        let c = table.basic(BasicKind::Int);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn underlying_chases_named_chains() {
        let mut table = TypeTable::new();
        let s = table.basic(BasicKind::String);
        let (inner, inner_ty) = table.declare_named("Inner".into(), Pos::default(), true);
        table.set_underlying(inner, s);
        let (outer, outer_ty) = table.declare_named("Outer".into(), Pos::default(), true);
        table.set_underlying(outer, inner_ty);

        assert_eq!(table.underlying(outer_ty), s);
        assert_eq!(table.underlying_basic(outer_ty), Some(BasicKind::String));
        assert_eq!(table.underlying(s), s);
    }

    #[test]
    fn display_is_go_notation() {
        let mut table = TypeTable::new();
        let item = {
            let s = table.basic(BasicKind::String);
            let (id, named_ty) = table.declare_named("Item".into(), Pos::default(), true);
            table.set_underlying(id, s);
            named_ty
        };
        let ptr = table.alloc(Type::Pointer(item));
        let slice = table.alloc(Type::Slice(ptr));
        assert_eq!(table.display(slice), "[]*Item");

        let elem = table.basic(BasicKind::Int);
        let arr = table.alloc(Type::Array(Some(4), elem));
        assert_eq!(table.display(arr), "[4]int");

        let key = table.basic(BasicKind::String);
        let map = table.alloc(Type::Map(key, item));
        assert_eq!(table.display(map), "map[string]Item");
    }

    #[test]
    fn exportedness_follows_first_rune() {
        assert!(is_exported("User"));
        assert!(!is_exported("user"));
        assert!(!is_exported("_User"));
        assert!(!is_exported(""));
    }
}
