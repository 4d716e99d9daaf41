//! Declarative-schema metadata.
//!
//! The schema is the component's JSON file. It marks the unit as a component
//! (`"component": true`) and may declare properties:
//!
//! ```json
//! {
//!   "component": true,
//!   "properties": {
//!     "size": { "type": "String", "description": "Button size" },
//!     "count": { "type": ["Number", "String"] },
//!     "value": { "type": { "type": "Number", "optionalTypes": ["String"] } },
//!     "label": "String"
//!   }
//! }
//! ```

use serde_json::Value;

use super::alias;
use super::ComponentMetadata;

/// Whether the schema marks its unit as a component.
pub fn is_component(schema: &Value) -> bool {
    schema.get("component").and_then(Value::as_bool) == Some(true)
}

/// Extract types and descriptions from a schema document.
pub fn schema_metadata(schema: &Value) -> ComponentMetadata {
    let mut meta = ComponentMetadata::default();
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return meta;
    };

    for (name, decl) in properties {
        let mut tokens = Vec::new();
        collect_type_tokens(decl, &mut tokens);
        let rendered = alias::union_of_tokens(&tokens).unwrap_or_else(|| "any".to_string());
        meta.types.insert(name.clone(), rendered);

        if let Some(doc) = decl
            .get("description")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            meta.docs.insert(name.clone(), doc.to_string());
        }
    }

    meta
}

/// Flatten the accepted `type` shapes into constructor tokens.
fn collect_type_tokens(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(token) => out.push(token.clone()),
        Value::Null => out.push("null".to_string()),
        Value::Array(items) => {
            for item in items {
                collect_type_tokens(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(inner) = map.get("type") {
                collect_type_tokens(inner, out);
            }
            if let Some(optional) = map.get("optionalTypes") {
                collect_type_tokens(optional, out);
            }
        }
        _ => {}
    }
}
