//! Name resolution and constant evaluation.
//!
//! Two passes over the parsed files: declare every package-level type name,
//! then resolve each declaration's right-hand side against its package
//! scope (falling back to the predeclared universe). Constants are
//! evaluated here but kept uninterpreted; the enumeration scanner decides
//! later how (and whether) a literal can be rendered.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::parser::{ConstExpr, Decl, FieldDecl, Ident, SourceFile, TypeExpr};
use super::{Package, Program, TypeNameObj};
use crate::error::LoadError;
use crate::types::{
    is_exported, BasicKind, ConstLit, Constant, Field, Pos, StructType, Type, TypeId, TypeTable,
};

static UNIVERSE: Lazy<HashMap<&'static str, BasicKind>> = Lazy::new(|| {
    use BasicKind::*;
    HashMap::from([
        ("bool", Bool),
        ("string", String),
        ("int", Int),
        ("int8", Int8),
        ("int16", Int16),
        ("int32", Int32),
        ("int64", Int64),
        ("uint", Uint),
        ("uint8", Uint8),
        ("uint16", Uint16),
        ("uint32", Uint32),
        ("uint64", Uint64),
        ("uintptr", Uintptr),
        ("float32", Float32),
        ("float64", Float64),
        ("complex64", Complex64),
        ("complex128", Complex128),
        ("byte", Uint8),
        ("rune", Int32),
        ("unsafe.Pointer", UnsafePointer),
    ])
});

pub(super) fn resolve(files: Vec<SourceFile>) -> Result<Program, LoadError> {
    let mut table = TypeTable::new();
    let mut packages: Vec<Package> = Vec::new();
    let mut pkg_of_file: Vec<usize> = Vec::new();

    // pass 1: declare every package-level type name
    for (file_id, file) in files.iter().enumerate() {
        let pkg_idx = match packages.iter().position(|p| p.name == file.package) {
            Some(i) => i,
            None => {
                packages.push(Package {
                    name: file.package.clone(),
                    scope: Vec::new(),
                    by_name: HashMap::new(),
                });
                packages.len() - 1
            }
        };
        pkg_of_file.push(pkg_idx);

        for decl in &file.decls {
            let Decl::Type(specs) = decl else { continue };
            for spec in specs {
                let pkg = &mut packages[pkg_idx];
                if pkg.by_name.contains_key(&spec.name.name) {
                    return Err(LoadError::Redeclared {
                        file: file.path.clone(),
                        line: spec.name.line,
                        name: spec.name.name.clone(),
                        package: pkg.name.clone(),
                    });
                }
                let pos = Pos {
                    file: file_id as u32,
                    offset: spec.name.span.start,
                };
                let exported = is_exported(&spec.name.name);
                let (named, ty) = table.declare_named(spec.name.name.clone(), pos, exported);
                pkg.by_name.insert(spec.name.name.clone(), pkg.scope.len());
                pkg.scope.push(TypeNameObj {
                    name: spec.name.name.clone(),
                    named,
                    ty,
                    pos,
                    line: spec.name.line,
                    exported,
                });
            }
        }
    }

    // pass 2: resolve right-hand sides
    for (file_id, file) in files.iter().enumerate() {
        let pkg_idx = pkg_of_file[file_id];
        for decl in &file.decls {
            let Decl::Type(specs) = decl else { continue };
            for spec in specs {
                let underlying = resolve_expr(
                    &mut table,
                    &packages[pkg_idx],
                    file_id as u32,
                    &file.path,
                    &spec.expr,
                )?;
                let named = packages[pkg_idx]
                    .lookup(&spec.name.name)
                    .expect("declared in pass 1")
                    .named;
                table.set_underlying(named, underlying);
            }
        }
    }

    // a chain of named types must bottom out at a structural type
    let total = packages.iter().map(|p| p.scope.len()).sum::<usize>();
    for pkg in &packages {
        for obj in &pkg.scope {
            let mut cur = obj.ty;
            let mut steps = 0usize;
            while let Type::Named(n) = table.get(cur) {
                cur = table.named(*n).underlying;
                steps += 1;
                if steps > total {
                    return Err(LoadError::Syntax {
                        file: files[obj.pos.file as usize].path.clone(),
                        line: obj.line,
                        message: format!("invalid recursive type {}", obj.name),
                    });
                }
            }
        }
    }

    // pass 3: constants (explicitly typed only; untyped ones can never
    // match an enum query)
    let mut constants = Vec::new();
    for (file_id, file) in files.iter().enumerate() {
        let pkg_idx = pkg_of_file[file_id];
        for decl in &file.decls {
            let Decl::Const(specs) = decl else { continue };
            let mut last: Option<(Option<&TypeExpr>, &[ConstExpr])> = None;
            for (iota, spec) in specs.iter().enumerate() {
                let (ty_expr, values) = if spec.values.is_empty() {
                    last.ok_or_else(|| LoadError::Syntax {
                        file: file.path.clone(),
                        line: spec.line,
                        message: "missing constant value".to_string(),
                    })?
                } else {
                    let entry = (spec.ty.as_ref(), spec.values.as_slice());
                    last = Some(entry);
                    entry
                };
                if spec.names.len() != values.len() {
                    return Err(LoadError::Syntax {
                        file: file.path.clone(),
                        line: spec.line,
                        message: format!(
                            "constant declaration has {} names but {} values",
                            spec.names.len(),
                            values.len()
                        ),
                    });
                }

                let declared = match ty_expr {
                    Some(expr) => {
                        let ty = resolve_expr(
                            &mut table,
                            &packages[pkg_idx],
                            file_id as u32,
                            &file.path,
                            expr,
                        )?;
                        if table.underlying_basic(ty).is_none() {
                            return Err(LoadError::Syntax {
                                file: file.path.clone(),
                                line: spec.line,
                                message: format!("invalid constant type {}", table.display(ty)),
                            });
                        }
                        Some(ty)
                    }
                    None => None,
                };

                for (name, value_expr) in spec.names.iter().zip(values) {
                    let value = eval_const(value_expr, iota as i128, &file.path, spec.line)?;
                    if let Some(ty) = declared {
                        constants.push(Constant {
                            name: name.name.clone(),
                            ty,
                            value,
                            pos: Pos {
                                file: file_id as u32,
                                offset: name.span.start,
                            },
                        });
                    }
                }
            }
        }
    }

    let mut paths = Vec::with_capacity(files.len());
    let mut docs = Vec::with_capacity(files.len());
    for file in files {
        paths.push(file.path);
        docs.push(file.doc_entries);
    }

    Ok(Program {
        files: paths,
        packages,
        types: table,
        constants,
        docs,
    })
}

fn resolve_expr(
    table: &mut TypeTable,
    pkg: &Package,
    file: u32,
    path: &str,
    expr: &TypeExpr,
) -> Result<TypeId, LoadError> {
    Ok(match expr {
        TypeExpr::Name(id) => return resolve_name(table, pkg, path, id),
        TypeExpr::Pointer(elem) => {
            let elem = resolve_expr(table, pkg, file, path, elem)?;
            table.alloc(Type::Pointer(elem))
        }
        TypeExpr::Slice(elem) => {
            let elem = resolve_expr(table, pkg, file, path, elem)?;
            table.alloc(Type::Slice(elem))
        }
        TypeExpr::Array(len, elem) => {
            let elem = resolve_expr(table, pkg, file, path, elem)?;
            table.alloc(Type::Array(*len, elem))
        }
        TypeExpr::Map(key, value) => {
            let key = resolve_expr(table, pkg, file, path, key)?;
            let value = resolve_expr(table, pkg, file, path, value)?;
            table.alloc(Type::Map(key, value))
        }
        TypeExpr::Chan(elem) => {
            let elem = resolve_expr(table, pkg, file, path, elem)?;
            table.alloc(Type::Chan(elem))
        }
        TypeExpr::Func => table.alloc(Type::Func),
        TypeExpr::Interface => table.alloc(Type::Interface),
        TypeExpr::Struct(field_decls) => {
            let mut fields = Vec::new();
            for fd in field_decls {
                let ty = resolve_expr(table, pkg, file, path, &fd.ty)?;
                push_fields(&mut fields, fd, ty, file);
            }
            table.alloc(Type::Struct(StructType { fields }))
        }
    })
}

fn push_fields(fields: &mut Vec<Field>, fd: &FieldDecl, ty: TypeId, file: u32) {
    if fd.embedded {
        let name = embedded_name(&fd.ty);
        fields.push(Field {
            exported: is_exported(&name),
            name,
            ty,
            tag: fd.tag.clone(),
            embedded: true,
            pos: Pos {
                file,
                offset: fd.span.start,
            },
        });
        return;
    }
    for id in &fd.names {
        fields.push(Field {
            name: id.name.clone(),
            ty,
            tag: fd.tag.clone(),
            embedded: false,
            exported: is_exported(&id.name),
            pos: Pos {
                file,
                offset: id.span.start,
            },
        });
    }
}

/// Field name an embedded type contributes: the unqualified type name.
fn embedded_name(expr: &TypeExpr) -> String {
    let inner = match expr {
        TypeExpr::Pointer(inner) => inner,
        other => return name_of(other),
    };
    name_of(inner)
}

fn name_of(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Name(id) => id
            .name
            .rsplit('.')
            .next()
            .unwrap_or(&id.name)
            .to_string(),
        _ => String::new(),
    }
}

fn resolve_name(
    table: &mut TypeTable,
    pkg: &Package,
    path: &str,
    id: &Ident,
) -> Result<TypeId, LoadError> {
    // package scope shadows the predeclared universe
    if let Some(obj) = pkg.lookup(&id.name) {
        return Ok(obj.ty);
    }
    if matches!(id.name.as_str(), "error" | "any") {
        return Ok(table.alloc(Type::Interface));
    }
    if let Some(kind) = UNIVERSE.get(id.name.as_str()) {
        return Ok(table.basic(*kind));
    }
    Err(LoadError::Undeclared {
        file: path.to_string(),
        line: id.line,
        name: id.name.clone(),
    })
}

fn eval_const(
    expr: &ConstExpr,
    iota: i128,
    path: &str,
    line: u32,
) -> Result<ConstLit, LoadError> {
    Ok(match expr {
        ConstExpr::Iota => ConstLit::Int(iota),
        ConstExpr::Bool(b) => ConstLit::Bool(*b),
        ConstExpr::Int(v) => ConstLit::Int(*v as i128),
        ConstExpr::Float(v) => ConstLit::Float(*v),
        ConstExpr::Imag => ConstLit::Complex,
        ConstExpr::Rune(c) => ConstLit::Int(*c as u32 as i128),
        ConstExpr::Str(s) => ConstLit::Str(s.clone()),
        ConstExpr::Neg(inner) => match eval_const(inner, iota, path, line)? {
            ConstLit::Int(v) => ConstLit::Int(-v),
            ConstLit::Float(v) => ConstLit::Float(-v),
            _ => {
                return Err(LoadError::Syntax {
                    file: path.to_string(),
                    line,
                    message: "invalid operand for unary minus".to_string(),
                })
            }
        },
    })
}
