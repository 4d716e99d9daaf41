//! Component name forms.
//!
//! A component may be referenced in kebab form (`t-button`) or in
//! declared-identifier form (`TButton`). These helpers convert between the
//! two and decide which lookup candidates a tag name produces.

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator used by kebab-form names.
pub const SEPARATOR: char = '-';

static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid boundary regex"));
static UPPER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z])([A-Z][a-z])").expect("valid boundary regex"));

/// Convert an identifier-form name to kebab form.
///
/// `FooBar` → `foo-bar`, `HttpXmlParser` → `http-xml-parser`,
/// `XMLParser` → `xml-parser`.
pub fn to_kebab_case(name: &str) -> String {
    let step = LOWER_UPPER.replace_all(name, "${1}-${2}");
    let step = UPPER_RUN.replace_all(&step, "${1}-${2}");
    step.to_lowercase()
}

/// Convert a kebab- or snake-form name to PascalCase.
///
/// `t-button` → `TButton`. Names without separators keep their
/// characters and only have the first one upper-cased.
pub fn to_pascal_case(name: &str) -> String {
    name.split(|c| c == SEPARATOR || c == '_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// The derived kebab-form candidate for a tag name, if any.
///
/// Only names that contain no separator and at least one upper-case letter
/// produce a derived candidate.
pub fn derived_candidate(name: &str) -> Option<String> {
    if name.contains(SEPARATOR) || !name.chars().any(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let kebab = to_kebab_case(name);
    (kebab != name).then_some(kebab)
}

/// Lookup candidates for a tag name: the name itself, then its derived form.
pub fn candidates(name: &str) -> Vec<String> {
    let mut out = vec![name.to_string()];
    if let Some(derived) = derived_candidate(name) {
        out.push(derived);
    }
    out
}

/// Whether `name` can be written as a bare identifier in generated source.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Render `name` as an object-literal key, quoting it when required.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Quote `value` as a single-quoted string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("TButton"), "t-button");
        assert_eq!(to_kebab_case("FooBar"), "foo-bar");
        assert_eq!(to_kebab_case("HttpXmlParser"), "http-xml-parser");
        assert_eq!(to_kebab_case("XMLParser"), "xml-parser");
        assert_eq!(to_kebab_case("Nav2Bar"), "nav2-bar");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("t-button"), "TButton");
        assert_eq!(to_pascal_case("van-cell-group"), "VanCellGroup");
        assert_eq!(to_pascal_case("card"), "Card");
        assert_eq!(to_pascal_case("my_widget"), "MyWidget");
    }

    #[test]
    fn test_derived_candidate() {
        assert_eq!(derived_candidate("TButton").as_deref(), Some("t-button"));
        assert_eq!(derived_candidate("t-button"), None);
        assert_eq!(derived_candidate("Foo-Bar"), None);
        assert_eq!(derived_candidate("button"), None);
    }

    #[test]
    fn test_candidates_order() {
        assert_eq!(candidates("TButton"), vec!["TButton", "t-button"]);
        assert_eq!(candidates("t-button"), vec!["t-button"]);
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("TButton"), "TButton");
        assert_eq!(property_key("t-button"), "'t-button'");
        assert_eq!(property_key("9lives"), "'9lives'");
        assert_eq!(quote("it's"), "'it\\'s'");
    }
}
