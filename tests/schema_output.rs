//! End-to-end run over the `testdata` fixture tree: load, generate, and
//! check the emitted document shape property by property.

use go_jsschema::generate;
use go_jsschema::schema::{Additional, PrimitiveType, Schema, SCHEMA_URL};
use pretty_assertions::assert_eq;
use serde_json::json;

fn fixture_schema() -> Schema {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/types.go");
    generate::from_args(&[path]).expect("fixture generates")
}

#[test]
fn root_document_shape() {
    let schema = fixture_schema();
    assert_eq!(schema.schema_ref.as_deref(), Some(SCHEMA_URL));
    assert_eq!(schema.additional_items, Some(Additional::Allowed(true)));
    assert_eq!(schema.additional_properties, Some(Additional::Allowed(true)));

    let names: Vec<&str> = schema.definitions.keys().map(|s| s.as_str()).collect();
    assert_eq!(
        names,
        ["User", "Embedded", "UserStatus", "Item", "Inventory", "Priority"]
    );
}

#[test]
fn user_properties_follow_tags_and_promotion() {
    let schema = fixture_schema();
    let user = &schema.definitions["User"];

    assert_eq!(user.ty, Some(PrimitiveType::Object));
    assert_eq!(
        user.description,
        "User is the public account record exposed over the wire."
    );

    let names: Vec<&str> = user.properties.keys().map(|s| s.as_str()).collect();
    assert_eq!(names, ["name", "nickname", "Status", "ID"]);

    // required in declaration order, excluding the omitempty nickname
    assert_eq!(user.required, ["name", "Status", "ID"]);

    assert_eq!(
        user.properties["name"].description,
        "Named is the account's display name."
    );
    assert_eq!(user.properties["name"].ty, Some(PrimitiveType::String));

    // named field type stays a reference; its expansion lives in definitions
    let status = &user.properties["Status"];
    assert_eq!(status.reference.as_deref(), Some("#/definitions/UserStatus"));
    assert_eq!(status.ty, None);
    assert!(status.properties.is_empty());

    // embedded pointer promotes ID flat, neither nested nor referenced
    let id = &user.properties["ID"];
    assert_eq!(id.ty, Some(PrimitiveType::Integer));
    assert_eq!(id.reference, None);
}

#[test]
fn status_enum_keeps_declaration_order() {
    let schema = fixture_schema();
    let status = &schema.definitions["UserStatus"];
    assert_eq!(status.ty, Some(PrimitiveType::String));
    assert_eq!(status.enum_, vec![json!("active"), json!("inactive")]);
    // only struct nodes and properties carry documentation
    assert_eq!(status.description, "");
}

#[test]
fn priority_enum_counts_from_iota() {
    let schema = fixture_schema();
    let priority = &schema.definitions["Priority"];
    assert_eq!(priority.ty, Some(PrimitiveType::Integer));
    assert_eq!(priority.enum_, vec![json!(0), json!(1), json!(2)]);
}

#[test]
fn slice_of_pointer_items_reference_their_definition() {
    let schema = fixture_schema();
    let related = &schema.definitions["Item"].properties["Related"];
    assert_eq!(
        serde_json::to_value(related).unwrap(),
        json!({
            "type": "array",
            "items": [{
                "$ref": "#/definitions/Item",
                "additionalItems": true,
                "additionalProperties": true,
            }],
        })
    );
}

#[test]
fn inventory_map_carries_item_references() {
    let schema = fixture_schema();
    let inventory = &schema.definitions["Inventory"];
    assert_eq!(inventory.ty, Some(PrimitiveType::Object));
    let Some(Additional::Schema(value)) = &inventory.additional_properties else {
        panic!("expected a value schema on additionalProperties");
    };
    assert_eq!(value.reference.as_deref(), Some("#/definitions/Item"));
}

#[test]
fn unexported_declarations_never_surface() {
    let schema = fixture_schema();
    assert!(!schema.definitions.contains_key("internalAudit"));
    let user = &schema.definitions["User"];
    assert!(!user.properties.contains_key("token"));
    assert!(!user.properties.contains_key("Hidden"));
    assert!(!user.required.iter().any(|n| n == "token" || n == "Hidden"));
}

#[test]
fn encoding_then_decoding_is_lossless() {
    let schema = fixture_schema();
    let encoded = serde_json::to_string(&schema).expect("encodes");
    let decoded: Schema = serde_json::from_str(&encoded).expect("decodes");
    assert_eq!(decoded, schema);

    // property insertion order survives the round trip
    let user = decoded.definitions["User"]
        .properties
        .keys()
        .map(|s| s.as_str())
        .collect::<Vec<_>>();
    assert_eq!(user, ["name", "nickname", "Status", "ID"]);
}

#[test]
fn glob_patterns_resolve_inputs() {
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/*.go");
    let schema = generate::from_args(&[pattern]).expect("glob input generates");
    assert!(schema.definitions.contains_key("User"));

    let missing = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/*.nope");
    assert!(generate::from_args(&[missing]).is_err());
}
