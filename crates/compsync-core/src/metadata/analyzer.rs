//! Source analyzers.
//!
//! An analyzer turns source text into a property → type-expression map. Two
//! built-in analyzers share a light object-literal scanner:
//!
//! - [`ScriptAnalyzer`] reads the `properties` table of a component
//!   definition (`Component({ properties: { size: String } })`) and maps
//!   constructor tokens through the alias table.
//! - [`DeclarationAnalyzer`] reads the `properties` member of a class or
//!   interface in a declaration file, following a named interface reference,
//!   and prefers each property's `value` type over its `type` constructor.
//!
//! The scanner understands strings, comments and bracket nesting; it is not a
//! parser and hosts with a real one can plug it in through [`SourceAnalyzer`].

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::alias;

/// Property name → rendered type expression.
pub type PropertyTypes = BTreeMap<String, String>;

/// Errors raised while analyzing source text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    /// A bracket opened at `offset` is never closed
    #[error("unbalanced bracket at offset {offset}")]
    Unbalanced { offset: usize },

    /// `properties` names a type the file does not define
    #[error("properties reference '{0}' is not defined in this file")]
    UnresolvedReference(String),
}

/// Extracts property types from one kind of source text.
pub trait SourceAnalyzer: Send + Sync {
    fn analyze(&self, source: &str) -> Result<PropertyTypes, AnalyzeError>;
}

/// Component-definition analyzer for behavior files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptAnalyzer;

impl SourceAnalyzer for ScriptAnalyzer {
    fn analyze(&self, source: &str) -> Result<PropertyTypes, AnalyzeError> {
        let source = strip_comments(source);
        let Some(body) = properties_body(&source)? else {
            return Ok(PropertyTypes::new());
        };

        let mut out = PropertyTypes::new();
        for shape in parse_properties(body)? {
            let tokens = shape.constructors.iter().chain(shape.optional_types.iter());
            let rendered = alias::union_of_tokens(tokens).unwrap_or_else(|| "any".to_string());
            out.insert(shape.name, rendered);
        }
        Ok(out)
    }
}

/// Declaration-file analyzer for shipped `.d.ts` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationAnalyzer;

impl SourceAnalyzer for DeclarationAnalyzer {
    fn analyze(&self, source: &str) -> Result<PropertyTypes, AnalyzeError> {
        let source = strip_comments(source);
        let Some(body) = properties_body(&source)? else {
            return Ok(PropertyTypes::new());
        };

        let mut out = PropertyTypes::new();
        for shape in parse_properties(body)? {
            let rendered = match shape.value.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => {
                    let tokens = shape.constructors.iter().chain(shape.optional_types.iter());
                    alias::union_of_tokens(tokens).unwrap_or_else(|| "any".to_string())
                }
            };
            out.insert(shape.name, rendered);
        }
        Ok(out)
    }
}

/// One entry of a `properties` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PropertyShape {
    name: String,
    constructors: Vec<String>,
    optional_types: Vec<String>,
    value: Option<String>,
}

static PROPERTIES_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bproperties\s*\??\s*[:=]\s*").expect("valid properties regex")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][\w$]*").expect("valid identifier regex"));

/// Locate the body (between braces) of the first `properties` table.
///
/// A named reference (`properties: TdButtonProps;`) is followed to an
/// `interface` or `type` alias in the same text.
fn properties_body(source: &str) -> Result<Option<&str>, AnalyzeError> {
    let Some(found) = PROPERTIES_KEY.find(source) else {
        return Ok(None);
    };
    let rest = &source[found.end()..];

    if rest.starts_with('{') {
        return braced_body(source, found.end()).map(Some);
    }

    let Some(ident) = IDENTIFIER.find(rest) else {
        return Ok(None);
    };
    let ident = ident.as_str();
    let pattern = format!(
        r"\b(?:interface\s+{0}\b[^{{]*|type\s+{0}\s*(?:<[^=]*>)?\s*=\s*)\{{",
        regex::escape(ident)
    );
    let definition = Regex::new(&pattern).ok().and_then(|re| re.find(source));
    match definition {
        Some(m) => braced_body(source, m.end() - 1).map(Some),
        None => Err(AnalyzeError::UnresolvedReference(ident.to_string())),
    }
}

/// The text strictly between the brace at `open` and its match.
fn braced_body(source: &str, open: usize) -> Result<&str, AnalyzeError> {
    let close = matching_close(source, open).ok_or(AnalyzeError::Unbalanced { offset: open })?;
    Ok(&source[open + 1..close])
}

/// Byte offset of the bracket closing the one at `open`.
fn matching_close(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'{' | b'[' | b'(' => stack.push(b),
            b'}' | b']' | b')' => {
                let expected = match b {
                    b'}' => b'{',
                    b']' => b'[',
                    _ => b'(',
                };
                if stack.pop() != Some(expected) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index just past the string literal starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Remove `//` and `/* */` comments outside string literals.
fn strip_comments(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;
    let mut copied_from = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&source[copied_from..i]);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                copied_from = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&source[copied_from..i]);
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                out.push(' ');
                copied_from = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&source[copied_from.min(source.len())..]);
    out
}

/// Split on separators that sit at bracket depth zero.
///
/// Angle brackets count as nesting so `Record<string, any>` stays whole;
/// the `>` of an arrow (`=>`) does not.
fn split_top_level<'a>(body: &'a str, separators: &[u8]) -> Vec<&'a str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'}' | b']' | b')' | b'>' => depth = depth.saturating_sub(1),
            b if depth == 0 && separators.contains(&b) => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&body[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split an entry into key and value at its first top-level colon.
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let parts = split_first_top_level(entry, b':')?;
    Some((parts.0.trim(), parts.1.trim()))
}

fn split_first_top_level(text: &str, separator: u8) -> Option<(&str, &str)> {
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'{' | b'[' | b'(' | b'<' => depth += 1,
            b'}' | b']' | b')' | b'>' => depth = depth.saturating_sub(1),
            b if b == separator && depth == 0 => return Some((&text[..i], &text[i + 1..])),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Normalize an entry key: drop modifiers, quotes and the optional marker.
fn clean_key(raw: &str) -> Option<String> {
    let key = raw.trim().trim_start_matches("readonly ").trim();
    let key = key.strip_suffix('?').unwrap_or(key).trim();
    let key = key.trim_matches(|c| c == '"' || c == '\'');
    if key.is_empty() || key.starts_with("...") || key.starts_with('[') {
        return None;
    }
    Some(key.to_string())
}

/// Constructor tokens from `String`, `[String, Number]` or `StringConstructor`.
fn constructor_tokens(text: &str) -> Vec<String> {
    let text = text.trim();
    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text);
    split_top_level(inner, b",|")
        .into_iter()
        .map(|t| t.trim_end_matches(" as any").trim().to_string())
        .collect()
}

fn parse_properties(body: &str) -> Result<Vec<PropertyShape>, AnalyzeError> {
    let mut shapes = Vec::new();
    for entry in split_top_level(body, b",;") {
        let Some((raw_key, value)) = split_entry(entry) else {
            continue;
        };
        let Some(name) = clean_key(raw_key) else {
            continue;
        };

        let mut shape = PropertyShape {
            name,
            ..Default::default()
        };

        if value.starts_with('{') {
            let inner = braced_body(value, 0)?;
            for field in split_top_level(inner, b",;") {
                let Some((field_key, field_value)) = split_entry(field) else {
                    continue;
                };
                match clean_key(field_key).as_deref() {
                    Some("type") => shape.constructors = constructor_tokens(field_value),
                    Some("optionalTypes") => {
                        shape.optional_types = constructor_tokens(field_value)
                    }
                    Some("value") => shape.value = Some(field_value.to_string()),
                    _ => {}
                }
            }
        } else {
            shape.constructors = constructor_tokens(value);
        }

        shapes.push(shape);
    }
    Ok(shapes)
}
