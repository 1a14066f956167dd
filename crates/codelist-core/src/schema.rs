//! Closed codelist properties in JSON Schema documents.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Keyword naming the codelist file of a property.
pub const CODELIST_KEY: &str = "codelist";
/// Keyword marking a property's codelist as open.
pub const OPEN_CODELIST_KEY: &str = "openCodelist";

/// A schema property whose values are exactly the codes of a codelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedProperty {
    /// JSON Pointer to the property node.
    pub pointer: String,
    /// Codelist file name (e.g. `a.csv`).
    pub codelist: String,
    /// Declared `type` values.
    pub types: Vec<String>,
}

impl ClosedProperty {
    pub fn is_array(&self) -> bool {
        has_type(&self.types, "array")
    }

    pub fn is_nullable(&self) -> bool {
        has_type(&self.types, "null")
    }
}

fn has_type(types: &[String], name: &str) -> bool {
    types.iter().any(|t| t == name)
}

/// Find every closed codelist property in a schema, depth first, in document order.
///
/// A node is a closed property when it has a string `codelist` and its
/// `openCodelist` is not `true`.
pub fn find_closed_properties(schema: &Value) -> Vec<ClosedProperty> {
    let mut found = Vec::new();
    walk(schema, &mut String::new(), &mut found);
    found
}

fn walk(node: &Value, pointer: &mut String, found: &mut Vec<ClosedProperty>) {
    match node {
        Value::Object(object) => {
            if let Some(codelist) = closed_codelist(object) {
                found.push(ClosedProperty {
                    pointer: pointer.clone(),
                    codelist: codelist.to_string(),
                    types: declared_types(object),
                });
            }
            for (key, child) in object {
                let len = pointer.len();
                push_token(pointer, key);
                walk(child, pointer, found);
                pointer.truncate(len);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let len = pointer.len();
                push_token(pointer, &index.to_string());
                walk(child, pointer, found);
                pointer.truncate(len);
            }
        }
        _ => {}
    }
}

fn closed_codelist(object: &Map<String, Value>) -> Option<&str> {
    let codelist = object.get(CODELIST_KEY)?.as_str()?;
    let open = object
        .get(OPEN_CODELIST_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    (!open).then_some(codelist)
}

/// `type` as a list: a single string, the strings of an array, or nothing.
pub fn declared_types(object: &Map<String, Value>) -> Vec<String> {
    match object.get("type") {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn push_token(pointer: &mut String, token: &str) {
    pointer.push('/');
    pointer.push_str(&token.replace('~', "~0").replace('/', "~1"));
}

/// Write `codes` into a property node.
///
/// Array-typed properties get `items.enum`; other properties get `enum`,
/// followed by `null` when `types` includes `"null"`. Returns true if the
/// node changed.
pub fn apply_enum(node: &mut Value, codes: &[String], types: &[String]) -> bool {
    let Some(object) = node.as_object_mut() else {
        return false;
    };
    let mut values: Vec<Value> = codes.iter().cloned().map(Value::String).collect();

    if has_type(types, "array") {
        let items = object
            .entry("items")
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(items) = items.as_object_mut() else {
            warn!("array property has non-object items, enum not set");
            return false;
        };
        return set_enum(items, values);
    }

    if has_type(types, "null") {
        values.push(Value::Null);
    }
    set_enum(object, values)
}

fn set_enum(object: &mut Map<String, Value>, values: Vec<Value>) -> bool {
    let values = Value::Array(values);
    if object.get("enum") == Some(&values) {
        return false;
    }
    object.insert("enum".to_string(), values);
    true
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn codes() -> Vec<String> {
        vec!["foo".to_string(), "bar".to_string()]
    }

    fn types(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn finds_closed_properties_with_pointers() {
        let schema = json!({
            "properties": {
                "closed": {"type": ["string", "null"], "codelist": "a.csv", "openCodelist": false},
                "open": {"type": "string", "codelist": "b.csv", "openCodelist": true},
                "implicit": {"type": "string", "codelist": "c.csv"},
                "nested": {
                    "type": "object",
                    "properties": {
                        "a/b": {"type": "array", "codelist": "d.csv", "openCodelist": false}
                    }
                }
            },
            "definitions": {
                "Item": {"anyOf": [{"codelist": "e.csv", "openCodelist": false}]}
            }
        });

        let found = find_closed_properties(&schema);
        let summary: Vec<(&str, &str)> = found
            .iter()
            .map(|p| (p.pointer.as_str(), p.codelist.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("/properties/closed", "a.csv"),
                ("/properties/implicit", "c.csv"),
                ("/properties/nested/properties/a~1b", "d.csv"),
                ("/definitions/Item/anyOf/0", "e.csv"),
            ]
        );
        assert!(found[0].is_nullable());
        assert!(found[2].is_array());
        assert!(found[3].types.is_empty());
        for property in &found {
            assert!(schema.pointer(&property.pointer).is_some());
        }
    }

    #[test]
    fn ignores_non_string_codelist() {
        let schema = json!({"properties": {"codelist": {"type": "string"}}});
        assert!(find_closed_properties(&schema).is_empty());
    }

    #[test]
    fn writes_scalar_enum_with_null() {
        let mut node = json!({"type": ["string", "null"], "codelist": "a.csv"});
        assert!(apply_enum(&mut node, &codes(), &types(&["string", "null"])));
        assert_eq!(node["enum"], json!(["foo", "bar", null]));
        assert!(!apply_enum(&mut node, &codes(), &types(&["string", "null"])));
    }

    #[test]
    fn rewrites_out_of_order_enum() {
        let mut node = json!({"type": "string", "enum": ["bar", "foo"]});
        assert!(apply_enum(&mut node, &codes(), &types(&["string"])));
        assert_eq!(node["enum"], json!(["foo", "bar"]));
    }

    #[test]
    fn writes_array_items_enum_without_null() {
        let mut node = json!({"type": ["array", "null"], "items": {"type": "string"}});
        assert!(apply_enum(&mut node, &codes(), &types(&["array", "null"])));
        assert_eq!(node["items"], json!({"type": "string", "enum": ["foo", "bar"]}));
        assert!(node.get("enum").is_none());
    }

    #[test]
    fn creates_missing_items() {
        let mut node = json!({"type": "array"});
        assert!(apply_enum(&mut node, &codes(), &types(&["array"])));
        assert_eq!(node["items"], json!({"enum": ["foo", "bar"]}));
    }

    #[test]
    fn skips_non_object_items() {
        let mut node = json!({"type": "array", "items": true});
        assert!(!apply_enum(&mut node, &codes(), &types(&["array"])));
        assert_eq!(node["items"], json!(true));
    }
}
