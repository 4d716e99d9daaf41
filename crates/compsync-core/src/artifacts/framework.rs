//! Framework-declaration artifact.
//!
//! Augments a framework module's `GlobalComponents` interface so templates
//! type-check component usage. Kebab-form names are mirrored in PascalCase,
//! and components with a known source file get a global binding so an editor
//! can jump to their definition.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use super::{object_type, ComponentView, GENERATED_BANNER};
use crate::naming;

/// Rendering options.
#[derive(Debug, Clone, Copy)]
pub struct FrameworkOptions<'a> {
    /// Module whose `GlobalComponents` is augmented, e.g. `vue`
    pub module: &'a str,
    /// Reference property types through this typed-declaration module
    /// instead of inlining them
    pub typed_module: Option<&'a str>,
    /// Directory the artifact is written to; local sources are imported
    /// relative to it
    pub output_dir: &'a Path,
}

/// Render the framework-declaration file.
pub fn render(components: &[ComponentView], options: &FrameworkOptions<'_>) -> String {
    let mut out = String::from(GENERATED_BANNER);
    match options.typed_module {
        Some(typed) => out.push_str(&format!(
            "import type {{ ComponentProp }} from {};\n",
            naming::quote(typed)
        )),
        None => out.push_str("export {};\n"),
    }
    out.push('\n');
    out.push_str("type __Component<Props> = new (...args: any[]) => { $props: Props };\n\n");

    out.push_str(&format!("declare module {} {{\n", naming::quote(options.module)));
    out.push_str("  export interface GlobalComponents {\n");
    for (key, props) in global_components(components, options.typed_module.is_some()) {
        out.push_str(&format!("    {}: __Component<{}>;\n", key, props));
    }
    out.push_str("  }\n}\n");

    let bindings = source_bindings(components, options.output_dir);
    if !bindings.is_empty() {
        out.push_str("\ndeclare global {\n");
        for (ident, specifier) in bindings {
            out.push_str(&format!(
                "  const {}: typeof import({});\n",
                ident,
                naming::quote(&specifier)
            ));
        }
        out.push_str("}\n");
    }

    out
}

/// Registry key → props type. Declared names win over derived variants.
fn global_components(components: &[ComponentView], reference: bool) -> BTreeMap<String, String> {
    let props = |component: &ComponentView| {
        if reference {
            format!("ComponentProp<{}>", naming::quote(&component.name))
        } else {
            object_type(&component.metadata, "    ")
        }
    };

    let mut entries: BTreeMap<String, String> = components
        .iter()
        .map(|c| (naming::property_key(&c.name), props(c)))
        .collect();

    for component in components {
        if !component.name.contains(naming::SEPARATOR) {
            continue;
        }
        let pascal = naming::to_pascal_case(&component.name);
        if naming::is_identifier(&pascal) {
            entries.entry(pascal).or_insert_with(|| props(component));
        }
    }
    entries
}

/// PascalCase identifier → import specifier for components with a source.
fn source_bindings(components: &[ComponentView], output_dir: &Path) -> BTreeMap<String, String> {
    let mut bindings = BTreeMap::new();
    for component in components {
        let Some(source) = &component.source else {
            continue;
        };
        let ident = naming::to_pascal_case(&component.name);
        if !naming::is_identifier(&ident) {
            continue;
        }
        let specifier = if component.local {
            relative_import(output_dir, source)
        } else {
            component.import_path.clone()
        };
        bindings.entry(ident).or_insert(specifier);
    }
    bindings
}

/// `./`-prefixed, extension-less import of `target` from `from_dir`.
fn relative_import(from_dir: &Path, target: &Path) -> String {
    let target = target.with_extension("");
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from.len() {
        segments.push("..".to_string());
    }
    for component in &to[common..] {
        segments.push(component.as_os_str().to_string_lossy().to_string());
    }

    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ComponentMetadata;
    use std::path::PathBuf;

    fn view(name: &str, import_path: &str, source: Option<&str>, local: bool) -> ComponentView {
        ComponentView {
            name: name.to_string(),
            import_path: import_path.to_string(),
            metadata: ComponentMetadata::default(),
            source: source.map(PathBuf::from),
            local,
        }
    }

    #[test]
    fn test_relative_import() {
        assert_eq!(
            relative_import(Path::new("/app"), Path::new("/app/components/card/card.ts")),
            "./components/card/card"
        );
        assert_eq!(
            relative_import(Path::new("/app/types"), Path::new("/app/components/card/card.ts")),
            "../components/card/card"
        );
    }

    #[test]
    fn test_kebab_names_get_pascal_variant() {
        let mut button = view("t-button", "ui/button/button", None, false);
        button.metadata.types.insert("size".to_string(), "string".to_string());
        let components = vec![button, view("Card", "/components/Card/Card", None, true)];

        let text = render(
            &components,
            &FrameworkOptions {
                module: "vue",
                typed_module: None,
                output_dir: Path::new("/app"),
            },
        );

        assert!(text.contains("export {};\n"));
        assert!(text.contains("declare module 'vue' {\n  export interface GlobalComponents {\n"));
        assert!(text.contains("    Card: __Component<Record<string, any>>;\n"));
        assert!(text.contains(
            "    TButton: __Component<{\n      readonly size?: string;\n    }>;\n"
        ));
        assert!(text.contains("    't-button': __Component<{\n"));
        assert!(!text.contains("declare global"));
    }

    #[test]
    fn test_reference_mode_and_bindings() {
        let components = vec![
            view("t-button", "ui/button/button", Some("/app/node_modules/ui/button/button.d.ts"), false),
            view("Card", "/components/Card/Card", Some("/app/components/Card/Card.ts"), true),
            view("t-tag", "ui/tag/tag", None, false),
        ];

        let text = render(
            &components,
            &FrameworkOptions {
                module: "vue",
                typed_module: Some("compsync/typed-components"),
                output_dir: Path::new("/app"),
            },
        );

        assert!(text.contains("import type { ComponentProp } from 'compsync/typed-components';\n"));
        assert!(text.contains("    TButton: __Component<ComponentProp<'t-button'>>;\n"));
        assert!(text.contains("    TTag: __Component<ComponentProp<'t-tag'>>;\n"));
        assert!(text.contains(
            "declare global {\n  const Card: typeof import('./components/Card/Card');\n  const TButton: typeof import('ui/button/button');\n}\n"
        ));
        assert!(!text.contains("const TTag"));
    }

    #[test]
    fn test_declared_name_wins_over_variant() {
        let mut declared = view("TButton", "local/TButton", None, true);
        declared.metadata.types.insert("own".to_string(), "number".to_string());
        let components = vec![declared, view("t-button", "ui/button/button", None, false)];

        let entries = global_components(&components, false);
        assert!(entries["TButton"].contains("readonly own?: number;"));
        assert_eq!(entries.len(), 2);
    }
}
