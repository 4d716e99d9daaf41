//! Typed-declaration artifact.
//!
//! Declares a type-only module whose `ComponentProps` interface has one member
//! per known component:
//!
//! ```ts
//! declare module 'compsync/typed-components' {
//!   export interface ComponentProps {
//!     't-button': {
//!       readonly size?: 'small' | 'medium' | 'large';
//!     };
//!     Card: Record<string, any>;
//!   }
//!   export type ComponentPropName = keyof ComponentProps;
//!   export type ComponentProp<Name extends string> = ...;
//! }
//! ```

use super::{object_type, ComponentView, GENERATED_BANNER};
use crate::naming;

/// Render the typed-declaration file for `components` under `module`.
pub fn render(components: &[ComponentView], module: &str) -> String {
    let mut out = String::from(GENERATED_BANNER);
    out.push_str(&format!("declare module {} {{\n", naming::quote(module)));
    out.push_str("  export interface ComponentProps {\n");

    if components.is_empty() {
        out.push_str("    [component: string]: Record<string, any>;\n");
    }
    for component in components {
        out.push_str(&format!(
            "    {}: {};\n",
            naming::property_key(&component.name),
            object_type(&component.metadata, "    ")
        ));
    }

    out.push_str("  }\n");
    out.push_str("  export type ComponentPropName = keyof ComponentProps;\n");
    out.push_str(
        "  export type ComponentProp<Name extends string> = Name extends ComponentPropName\n    ? ComponentProps[Name]\n    : Record<string, any>;\n",
    );
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ComponentMetadata;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_components() {
        let mut metadata = ComponentMetadata::default();
        metadata.types.insert("size".to_string(), "'small' | 'large'".to_string());
        let components = vec![
            ComponentView {
                name: "Card".to_string(),
                import_path: "/components/Card/Card".to_string(),
                ..Default::default()
            },
            ComponentView {
                name: "t-button".to_string(),
                import_path: "ui/button/button".to_string(),
                metadata,
                ..Default::default()
            },
        ];

        let text = render(&components, "compsync/typed-components");
        let expected = format!(
            "{}{}",
            GENERATED_BANNER,
            r#"declare module 'compsync/typed-components' {
  export interface ComponentProps {
    Card: Record<string, any>;
    't-button': {
      readonly size?: 'small' | 'large';
    };
  }
  export type ComponentPropName = keyof ComponentProps;
  export type ComponentProp<Name extends string> = Name extends ComponentPropName
    ? ComponentProps[Name]
    : Record<string, any>;
}
"#
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_set_falls_back_to_index_entry() {
        let text = render(&[], "typed");
        assert!(text.contains("    [component: string]: Record<string, any>;\n"));
        assert!(text.contains("declare module 'typed' {"));
    }
}
