//! Type-to-schema mapping.
//!
//! The registry driver walks each package's exported top-level type names
//! and hands their underlying types to the recursive mapping engine. The
//! engine keeps named references symbolic (`#/definitions/<Name>`) except
//! while flattening an embedded field, where the named type is expanded in
//! place so its properties promote into the parent. Primitive nodes consult
//! the constant scanner for an enum, keyed on the declaring object's
//! original (possibly named) type. Any unsupported category is a typed
//! failure; nothing is dropped silently.

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::loader::{self, Program};
use crate::schema::{Additional, PrimitiveType, Schema, SCHEMA_URL};
use crate::tags;
use crate::types::{BasicKind, ConstLit, Constant, Pos, StructType, Type, TypeId};

/// Load the given paths or glob patterns and generate the root document.
pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Schema> {
    let program = loader::load_args(args)?;
    generate(&program)
}

/// Registry driver: one definition per exported package-level type name,
/// mapped at the declaration site itself (so a struct's own definition is
/// expanded while references to it from other fields stay `$ref` nodes).
pub fn generate(program: &Program) -> Result<Schema> {
    let mut root = Schema::new();
    root.schema_ref = Some(SCHEMA_URL.to_string());
    root.additional_items = Some(Additional::any());
    root.additional_properties = Some(Additional::any());

    for pkg in &program.packages {
        for obj in &pkg.scope {
            if !obj.exported {
                continue;
            }
            debug!(name = %obj.name, package = %pkg.name, "mapping definition");
            let node = map_type(
                program,
                program.types.underlying(obj.ty),
                ObjRef {
                    name: &obj.name,
                    ty: obj.ty,
                    pos: obj.pos,
                },
                false,
            )?;
            root.definitions.insert(obj.name.clone(), node);
        }
    }

    Ok(root)
}

/// The declaring object a type is being mapped for: a type name or a
/// struct field. Supplies the position for doc lookup and the original
/// type for enum discovery.
#[derive(Clone, Copy)]
struct ObjRef<'a> {
    name: &'a str,
    ty: TypeId,
    pos: Pos,
}

fn map_type(program: &Program, ty: TypeId, obj: ObjRef<'_>, inline: bool) -> Result<Schema> {
    match program.types.get(ty) {
        Type::Basic(kind) => {
            let mut schema = map_basic(program, *kind, obj)?;
            // enum discovery keys on the declaring object's original type,
            // not the underlying primitive
            let values = enum_values(program, obj.ty)?;
            if !values.is_empty() {
                schema.enum_ = values;
            }
            Ok(schema)
        }

        Type::Named(id) => {
            if inline {
                map_type(program, program.types.underlying(ty), obj, true)
            } else {
                Ok(Schema::reference_to(&program.types.named(*id).name))
            }
        }

        Type::Pointer(elem) => map_type(program, *elem, obj, inline),

        Type::Slice(elem) => {
            let item = map_type(program, *elem, obj, false)?;
            let mut schema = Schema::of(PrimitiveType::Array);
            schema.items = vec![item];
            Ok(schema)
        }

        Type::Map(_key, value) => {
            // keys are assumed string-like and are not validated
            let value_schema = map_type(program, *value, obj, false)?;
            let mut schema = Schema::of(PrimitiveType::Object);
            schema.additional_items = Some(Additional::any());
            schema.additional_properties = Some(Additional::schema(value_schema));
            Ok(schema)
        }

        Type::Struct(st) => map_struct(program, st, obj),

        Type::Array(..) | Type::Chan(_) | Type::Func | Type::Interface => {
            Err(Error::UnsupportedType {
                ty: program.types.display(ty),
                object: obj.name.to_string(),
            })
        }
    }
}

fn map_basic(program: &Program, kind: BasicKind, obj: ObjRef<'_>) -> Result<Schema> {
    use BasicKind::*;
    let ty = match kind {
        Bool => PrimitiveType::Boolean,
        Int | Int8 | Int16 | Int32 | Int64 | Uint | Uint8 | Uint16 | Uint32 | Uint64 => {
            PrimitiveType::Integer
        }
        String => PrimitiveType::String,
        Float32 | Float64 | Complex64 | Complex128 | Uintptr | UnsafePointer => {
            return Err(Error::UnsupportedType {
                ty: program.types.display(program.types.underlying(obj.ty)),
                object: obj.name.to_string(),
            });
        }
    };
    Ok(Schema::of(ty))
}

fn map_struct(program: &Program, st: &StructType, obj: ObjRef<'_>) -> Result<Schema> {
    let mut schema = Schema::of(PrimitiveType::Object);
    schema.description = program.doc_at(obj.pos);

    for field in &st.fields {
        if !field.exported {
            continue;
        }
        let json_tag = tags::get(field.tag.as_deref().unwrap_or_default(), "json");
        if json_tag == "-" {
            continue;
        }
        let field_obj = ObjRef {
            name: &field.name,
            ty: field.ty,
            pos: field.pos,
        };

        if field.embedded {
            // flatten: the embedded type's exported properties promote
            // into this node; same-name collisions are last-write-wins
            let inner = map_type(program, field.ty, field_obj, true)?;
            for (name, prop) in inner.properties {
                schema.properties.insert(name, prop);
            }
            for name in inner.required {
                if !schema.required.contains(&name) {
                    schema.required.push(name);
                }
            }
            continue;
        }

        let mut prop = map_type(program, field.ty, field_obj, false)?;
        let (tag_name, opts) = tags::parse_tag(&json_tag);
        let name = if tag_name.is_empty() {
            field.name.clone()
        } else {
            tag_name.to_string()
        };
        prop.description = program.doc_at(field.pos);
        schema.properties.insert(name.clone(), prop);
        if !opts.contains("omitempty") && !schema.required.contains(&name) {
            schema.required.push(name);
        }
    }

    Ok(schema)
}

/// Constant enumeration scan: every constant across every loaded file
/// whose declared type is exactly `ty`, in encounter order.
fn enum_values(program: &Program, ty: TypeId) -> Result<Vec<serde_json::Value>> {
    let mut values = Vec::new();
    for con in &program.constants {
        if con.ty != ty {
            continue;
        }
        values.push(literal_value(program, con)?);
    }
    Ok(values)
}

/// Render one constant according to its underlying primitive kind, with
/// integers widened to 64 bits. An unsupported kind is a hard failure; a
/// partially populated enum would silently misrepresent the domain.
fn literal_value(program: &Program, con: &Constant) -> Result<serde_json::Value> {
    use BasicKind::*;
    let Some(kind) = program.types.underlying_basic(con.ty) else {
        return Err(Error::UnsupportedLiteral {
            kind: "non-basic",
            name: con.name.clone(),
        });
    };
    let value = match (kind, &con.value) {
        (Complex64 | Complex128, _) | (_, ConstLit::Complex) => {
            return Err(Error::UnsupportedLiteral {
                kind: "complex",
                name: con.name.clone(),
            });
        }
        (Uintptr, _) => {
            return Err(Error::UnsupportedLiteral {
                kind: "uintptr",
                name: con.name.clone(),
            });
        }
        (UnsafePointer, _) => {
            return Err(Error::UnsupportedLiteral {
                kind: "unsafe.Pointer",
                name: con.name.clone(),
            });
        }
        (Bool, ConstLit::Bool(b)) => json!(b),
        (Float32, ConstLit::Float(f)) => json!(*f as f32 as f64),
        (Float32, ConstLit::Int(i)) => json!(*i as f32 as f64),
        (Float64, ConstLit::Float(f)) => json!(f),
        (Float64, ConstLit::Int(i)) => json!(*i as f64),
        (Int | Int8 | Int16 | Int32 | Int64, ConstLit::Int(i)) => json!(*i as i64),
        (Int | Int8 | Int16 | Int32 | Int64, ConstLit::Float(f)) => json!(*f as i64),
        (Uint | Uint8 | Uint16 | Uint32 | Uint64, ConstLit::Int(i)) => json!(*i as u64),
        (Uint | Uint8 | Uint16 | Uint32 | Uint64, ConstLit::Float(f)) => json!(*f as u64),
        (String, ConstLit::Str(s)) => json!(s),
        _ => {
            return Err(Error::UnsupportedLiteral {
                kind: kind.name(),
                name: con.name.clone(),
            });
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gen_src(srcs: &[&str]) -> Result<Schema> {
        let sources = srcs
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("file{i}.go"), s.to_string()))
            .collect();
        let program = loader::load_sources(sources)?;
        generate(&program)
    }

    #[test]
    fn only_exported_types_become_definitions() {
        let schema = gen_src(&["package a\n\ntype User struct{}\ntype helper struct{}\ntype Flag bool\n"]).unwrap();
        let names: Vec<&String> = schema.definitions.keys().collect();
        assert_eq!(names, ["User", "Flag"]);
        assert_eq!(schema.schema_ref.as_deref(), Some(SCHEMA_URL));
    }

    #[test]
    fn primitive_definitions_map_by_kind() {
        let schema = gen_src(&["package a\n\ntype Flag bool\ntype Count uint16\ntype Label string\n"]).unwrap();
        assert_eq!(schema.definitions["Flag"].ty, Some(PrimitiveType::Boolean));
        assert_eq!(schema.definitions["Count"].ty, Some(PrimitiveType::Integer));
        assert_eq!(schema.definitions["Label"].ty, Some(PrimitiveType::String));
    }

    #[test]
    fn named_field_types_become_references() {
        let schema = gen_src(&[
            "package a\n\ntype User struct {\n\tStatus Status\n}\n\ntype Status string\n",
        ])
        .unwrap();
        let status = &schema.definitions["User"].properties["Status"];
        assert_eq!(status.reference.as_deref(), Some("#/definitions/Status"));
        assert_eq!(status.ty, None);
        // the referenced definition keeps its own expansion
        assert_eq!(schema.definitions["Status"].ty, Some(PrimitiveType::String));
    }

    #[test]
    fn pointers_are_transparent() {
        let schema = gen_src(&["package a\n\ntype T struct {\n\tName *string\n\tAlso **string\n}\n"]).unwrap();
        let t = &schema.definitions["T"];
        assert_eq!(t.properties["Name"].ty, Some(PrimitiveType::String));
        assert_eq!(t.properties["Also"].ty, Some(PrimitiveType::String));
    }

    #[test]
    fn slices_nest_their_element_schema_as_a_singleton() {
        let schema = gen_src(&[
            "package a\n\ntype Item struct{}\n\ntype List struct {\n\tItems []*Item\n\tTags []string\n}\n",
        ])
        .unwrap();
        let items = &schema.definitions["List"].properties["Items"];
        assert_eq!(items.ty, Some(PrimitiveType::Array));
        assert_eq!(items.items.len(), 1);
        assert_eq!(
            items.items[0].reference.as_deref(),
            Some("#/definitions/Item")
        );
        let tags = &schema.definitions["List"].properties["Tags"];
        assert_eq!(tags.items[0].ty, Some(PrimitiveType::String));
    }

    #[test]
    fn maps_carry_their_value_schema_on_additional_properties() {
        let schema = gen_src(&[
            "package a\n\ntype Item struct{}\n\ntype Inventory map[string]Item\n",
        ])
        .unwrap();
        let inv = &schema.definitions["Inventory"];
        assert_eq!(inv.ty, Some(PrimitiveType::Object));
        let Some(Additional::Schema(value)) = &inv.additional_properties else {
            panic!("expected a value schema");
        };
        assert_eq!(value.reference.as_deref(), Some("#/definitions/Item"));
    }

    #[test]
    fn tags_drive_naming_and_optionality() {
        let schema = gen_src(&[
            "package a\n\ntype User struct {\n\tNamed string `json:\"name\"`\n\tNick string `json:\"nickname,omitempty\"`\n\tPlain string `json:\",omitempty\"`\n\tHidden string `json:\"-\"`\n\tsecret string\n}\n",
        ])
        .unwrap();
        let user = &schema.definitions["User"];
        let names: Vec<&String> = user.properties.keys().collect();
        assert_eq!(names, ["name", "nickname", "Plain"]);
        assert_eq!(user.required, ["name"]);
    }

    #[test]
    fn embedded_fields_promote_their_properties() {
        let schema = gen_src(&[
            "package a\n\ntype Base struct {\n\tID uint64\n\tRev string `json:\"rev,omitempty\"`\n}\n\ntype Doc struct {\n\tTitle string\n\t*Base\n}\n",
        ])
        .unwrap();
        let doc = &schema.definitions["Doc"];
        let names: Vec<&String> = doc.properties.keys().collect();
        assert_eq!(names, ["Title", "ID", "rev"]);
        // promoted flat, neither nested nor referenced
        assert_eq!(doc.properties["ID"].ty, Some(PrimitiveType::Integer));
        assert_eq!(doc.properties["ID"].reference, None);
        assert_eq!(doc.required, ["Title", "ID"]);
    }

    #[test]
    fn embedded_collisions_are_last_write_wins() {
        let schema = gen_src(&[
            "package a\n\ntype A struct {\n\tX string\n}\n\ntype B struct {\n\tX int\n}\n\ntype C struct {\n\tA\n\tB\n}\n",
        ])
        .unwrap();
        let c = &schema.definitions["C"];
        assert_eq!(c.properties.len(), 1);
        assert_eq!(c.properties["X"].ty, Some(PrimitiveType::Integer));
        assert_eq!(c.required, ["X"]);
    }

    #[test]
    fn string_enums_populate_from_declared_constants() {
        let schema = gen_src(&[
            "package a\n\ntype Status string\n\nconst (\n\tActive Status = \"active\"\n\tInactive Status = \"inactive\"\n)\n",
        ])
        .unwrap();
        assert_eq!(
            schema.definitions["Status"].enum_,
            vec![json!("active"), json!("inactive")]
        );
    }

    #[test]
    fn integer_enums_widen_iota_values() {
        let schema = gen_src(&[
            "package a\n\ntype Priority int\n\nconst (\n\tLow Priority = iota\n\tMid\n\tHigh\n)\n",
        ])
        .unwrap();
        assert_eq!(
            schema.definitions["Priority"].enum_,
            vec![json!(0), json!(1), json!(2)]
        );
    }

    #[test]
    fn enum_scan_crosses_file_boundaries() {
        let schema = gen_src(&[
            "package a\n\ntype Status string\n",
            "package a\n\nconst Active Status = \"active\"\n",
        ])
        .unwrap();
        assert_eq!(schema.definitions["Status"].enum_, vec![json!("active")]);
    }

    #[test]
    fn struct_and_field_docs_are_attached() {
        let schema = gen_src(&[
            "package a\n\n// User is the public account record.\ntype User struct {\n\t// Name is the display name.\n\tName string\n\tAge int\n}\n",
        ])
        .unwrap();
        let user = &schema.definitions["User"];
        assert_eq!(user.description, "User is the public account record.");
        assert_eq!(user.properties["Name"].description, "Name is the display name.");
        assert_eq!(user.properties["Age"].description, "");
    }

    #[test]
    fn reference_to_an_unexported_type_dangles() {
        let schema = gen_src(&[
            "package a\n\ntype Order struct {\n\tState orderState\n}\n\ntype orderState string\n",
        ])
        .unwrap();
        assert!(!schema.definitions.contains_key("orderState"));
        assert_eq!(
            schema.definitions["Order"].properties["State"]
                .reference
                .as_deref(),
            Some("#/definitions/orderState")
        );
    }

    #[test]
    fn unsupported_categories_fail_loudly() {
        for src in [
            "package a\n\ntype T struct {\n\tC chan int\n}\n",
            "package a\n\ntype T struct {\n\tF func(int) int\n}\n",
            "package a\n\ntype T struct {\n\tI interface{}\n}\n",
            "package a\n\ntype T struct {\n\tA [4]byte\n}\n",
            "package a\n\ntype T struct {\n\tX float64\n}\n",
            "package a\n\ntype T struct {\n\tP uintptr\n}\n",
        ] {
            let err = gen_src(&[src]).unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedType { .. }),
                "expected unsupported-type failure for {src:?}, got {err}"
            );
        }
    }

    #[test]
    fn hidden_fields_of_unsupported_type_are_skipped_before_mapping() {
        let schema = gen_src(&[
            "package a\n\ntype T struct {\n\tC chan int `json:\"-\"`\n\tOk string\n}\n",
        ])
        .unwrap();
        let t = &schema.definitions["T"];
        assert_eq!(t.properties.len(), 1);
        assert!(t.properties.contains_key("Ok"));
    }

    #[test]
    fn unsupported_literal_kinds_fail_the_scan() {
        let err = gen_src(&[
            "package a\n\ntype Status string\n\nconst Weird Status = 3i\n",
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedLiteral { kind: "complex", .. }
        ));
    }

    #[test]
    fn boolean_and_float_literals_render_by_kind() {
        let schema = gen_src(&[
            "package a\n\ntype Flag bool\n\nconst (\n\tOn Flag = true\n\tOff Flag = false\n)\n",
        ])
        .unwrap();
        assert_eq!(
            schema.definitions["Flag"].enum_,
            vec![json!(true), json!(false)]
        );
    }
}
