//! Editor-schema artifact in the editor custom-data format.
//!
//! ```json
//! { "version": 1.1, "tags": [ { "name": "t-button", "attributes": [ ... ] } ] }
//! ```
//!
//! Base tags (platform built-ins) come first; a generated tag replaces a
//! base tag of the same name.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use super::ComponentView;
use crate::error::SyncError;

pub const HTML_DATA_VERSION: f64 = 1.1;

#[derive(Debug, Serialize)]
struct HtmlData<'a> {
    version: f64,
    tags: Vec<&'a Value>,
}

#[derive(Debug, Serialize)]
struct TagData {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    attributes: Vec<AttributeData>,
}

#[derive(Debug, Serialize)]
struct AttributeData {
    name: String,
    description: String,
}

/// Render the editor-schema document, with a trailing newline.
pub fn render(components: &[ComponentView], base_tags: &[Value]) -> Result<String, SyncError> {
    let generated: Vec<Value> = components
        .iter()
        .map(|c| serde_json::to_value(tag_for(c)))
        .collect::<Result<_, _>>()
        .map_err(|e| SyncError::serialize("editor schema", e))?;

    let generated_names: BTreeSet<&str> = components.iter().map(|c| c.name.as_str()).collect();
    let tags = base_tags
        .iter()
        .filter(|tag| {
            tag.get("name")
                .and_then(Value::as_str)
                .map_or(true, |name| !generated_names.contains(name))
        })
        .chain(generated.iter())
        .collect();

    let data = HtmlData {
        version: HTML_DATA_VERSION,
        tags,
    };
    let mut text = serde_json::to_string_pretty(&data)
        .map_err(|e| SyncError::serialize("editor schema", e))?;
    text.push('\n');
    Ok(text)
}

fn tag_for(component: &ComponentView) -> TagData {
    let attributes = component
        .metadata
        .types
        .iter()
        .map(|(name, ty)| {
            let mut description = format!("Type: `{}`", ty);
            if let Some(doc) = component.metadata.docs.get(name) {
                description.push_str("\n\n");
                description.push_str(doc);
            }
            AttributeData {
                name: name.clone(),
                description,
            }
        })
        .collect();

    TagData {
        name: component.name.clone(),
        description: Some(format!("`{}`", component.import_path)),
        attributes,
    }
}

/// Load base tags from a JSON file holding either a tag array or a full
/// custom-data document with a `tags` array.
pub async fn load_base_tags(path: &Path) -> Result<Vec<Value>, SyncError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::read(path, e))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| SyncError::invalid_input(path, e.to_string()))?;

    match value {
        Value::Array(tags) => Ok(tags),
        Value::Object(mut map) => match map.remove("tags") {
            Some(Value::Array(tags)) => Ok(tags),
            _ => Err(SyncError::invalid_input(path, "expected a `tags` array")),
        },
        _ => Err(SyncError::invalid_input(path, "expected a tag array or an object with `tags`")),
    }
}
