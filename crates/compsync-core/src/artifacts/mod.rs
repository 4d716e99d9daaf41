//! Artifact Synchronizers
//!
//! Four generated artifacts are derived from the same registry and metadata
//! state:
//!
//! - [`manifest`]: name → import path JSON
//! - [`typed`]: a type-only module exposing `ComponentProps`
//! - [`framework`]: a global-component registry augmentation
//! - [`html_data`]: editor tag/attribute data
//!
//! Renderers are pure functions of a snapshot. Persistence and change
//! detection live in [`writer`].

pub mod framework;
pub mod html_data;
pub mod manifest;
pub mod typed;
pub mod writer;

use std::fmt;
use std::path::PathBuf;

use crate::metadata::ComponentMetadata;
use crate::naming;

pub use writer::{ArtifactWriter, WriteOutcome};

/// Banner placed at the top of generated declaration files.
pub const GENERATED_BANNER: &str =
    "/* eslint-disable */\n// Generated by compsync. Do not edit by hand.\n";

/// The four artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    Manifest,
    Typed,
    Framework,
    EditorSchema,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Manifest,
        ArtifactKind::Typed,
        ArtifactKind::Framework,
        ArtifactKind::EditorSchema,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Typed => "typed-declaration",
            Self::Framework => "framework-declaration",
            Self::EditorSchema => "editor-schema",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a renderer needs to know about one component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentView {
    pub name: String,
    pub import_path: String,
    pub metadata: ComponentMetadata,
    /// Navigable source file for "go to definition", when one is known
    pub source: Option<PathBuf>,
    /// Whether the component lives inside the project
    pub local: bool,
}

/// Render a metadata property table as an object type literal.
///
/// Components without properties get an open-ended record type.
pub(crate) fn object_type(metadata: &ComponentMetadata, indent: &str) -> String {
    if !metadata.has_properties() {
        return "Record<string, any>".to_string();
    }

    let mut out = String::from("{\n");
    for (prop, ty) in &metadata.types {
        if let Some(doc) = metadata.docs.get(prop) {
            out.push_str(&format!("{}  /** {} */\n", indent, doc.replace("*/", "*\\/")));
        }
        out.push_str(&format!(
            "{}  readonly {}?: {};\n",
            indent,
            naming::property_key(prop),
            ty
        ));
    }
    out.push_str(indent);
    out.push('}');
    out
}
