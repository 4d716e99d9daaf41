//! Manifest artifact: a flat `{ "<name>": "<import path>" }` JSON object.

use std::collections::BTreeMap;

use crate::error::SyncError;

/// Render the manifest. Keys come out sorted because the map is ordered.
pub fn render(entries: &BTreeMap<String, String>) -> Result<String, SyncError> {
    serde_json::to_string_pretty(entries).map_err(|e| SyncError::serialize("manifest", e))
}

/// Parse a previously rendered manifest.
pub fn parse(text: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_sorted() {
        let mut entries = BTreeMap::new();
        entries.insert("t-button".to_string(), "tdesign-miniprogram/button/button".to_string());
        entries.insert("Card".to_string(), "/components/Card/Card".to_string());

        assert_eq!(
            render(&entries).unwrap(),
            "{\n  \"Card\": \"/components/Card/Card\",\n  \"t-button\": \"tdesign-miniprogram/button/button\"\n}"
        );
    }

    #[test]
    fn test_empty_manifest() {
        assert_eq!(render(&BTreeMap::new()).unwrap(), "{}");
    }
}
