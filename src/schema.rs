//! JSON-Schema-shaped output tree.
//!
//! One node type; the root additionally carries `$schema` and the
//! `definitions` table. Property and definition maps are insertion-ordered
//! so the emitted document is deterministic, and every field round-trips
//! through serde unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dialect the generated documents declare.
pub const SCHEMA_URL: &str = "http://json-schema.org/draft-04/schema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Object,
    Array,
    String,
    Integer,
    Boolean,
}

/// `additionalItems` / `additionalProperties`: either the permissive
/// placeholder (serialized as JSON `true`) or a concrete schema, as used
/// by map nodes to carry their value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Additional {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl Additional {
    /// The "unconstrained" placeholder.
    pub fn any() -> Self {
        Additional::Allowed(true)
    }

    pub fn schema(schema: Schema) -> Self {
        Additional::Schema(Box::new(schema))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none", default)]
    pub schema_ref: Option<String>,

    /// `#/definitions/<Name>` pointer; mutually exclusive with `type` and
    /// `properties` by construction.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none", default)]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub ty: Option<PrimitiveType>,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub description: String,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub properties: IndexMap<String, Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub required: Vec<String>,

    /// Singleton list holding the element schema of array nodes.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub items: Vec<Schema>,

    #[serde(
        rename = "additionalItems",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub additional_items: Option<Additional>,

    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub additional_properties: Option<Additional>,

    /// Literal values of the constant group backing a primitive node, in
    /// declaration order.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_: Vec<serde_json::Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub definitions: IndexMap<String, Schema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(ty: PrimitiveType) -> Self {
        Schema {
            ty: Some(ty),
            ..Self::default()
        }
    }

    /// Bare reference node pointing into the root `definitions` table.
    /// Carries the permissive placeholders and no description; the
    /// description lives on the referenced definition.
    pub fn reference_to(name: &str) -> Self {
        Schema {
            reference: Some(format!("#/definitions/{name}")),
            additional_items: Some(Additional::any()),
            additional_properties: Some(Additional::any()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_collections_are_omitted() {
        let schema = Schema::of(PrimitiveType::String);
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({"type": "string"}));
    }

    #[test]
    fn reference_nodes_serialize_with_placeholders() {
        let schema = Schema::reference_to("Item");
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "$ref": "#/definitions/Item",
                "additionalItems": true,
                "additionalProperties": true,
            })
        );
    }

    #[test]
    fn map_value_schema_rides_additional_properties() {
        let mut schema = Schema::of(PrimitiveType::Object);
        schema.additional_properties = Some(Additional::schema(Schema::reference_to("Item")));
        let v = serde_json::to_value(&schema).unwrap();
        assert_eq!(v["additionalProperties"]["$ref"], "#/definitions/Item");
    }

    #[test]
    fn documents_round_trip() {
        let mut user = Schema::of(PrimitiveType::Object);
        user.description = "a user".to_string();
        user.properties.insert("name".to_string(), Schema::of(PrimitiveType::String));
        let mut items = Schema::of(PrimitiveType::Array);
        items.items = vec![Schema::reference_to("Item")];
        user.properties.insert("items".to_string(), items);
        user.required = vec!["name".to_string()];

        let mut root = Schema::new();
        root.schema_ref = Some(SCHEMA_URL.to_string());
        root.additional_items = Some(Additional::any());
        root.additional_properties = Some(Additional::any());
        root.definitions.insert("User".to_string(), user);

        let encoded = serde_json::to_string(&root).unwrap();
        let decoded: Schema = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn enum_values_keep_declaration_order() {
        let mut schema = Schema::of(PrimitiveType::String);
        schema.enum_ = vec![json!("active"), json!("inactive")];
        let v = serde_json::to_value(&schema).unwrap();
        assert_eq!(v["enum"], json!(["active", "inactive"]));
    }
}
