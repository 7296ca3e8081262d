//! Canonical to TypeScript type mapping

use super::{describe, Target, TypeFlags, TypeFormatter};
use crate::model::TypeMeta;

const NULL_MARKER: &str = " | null";

/// Formats canonical types as TypeScript type expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptFormatter;

impl TypeScriptFormatter {
    fn primitive(name: &str) -> Option<&'static str> {
        let ts = match name {
            "string" | "char" | "Guid" | "DateTime" | "DateTimeOffset" | "DateOnly"
            | "TimeOnly" | "TimeSpan" => "string",
            "byte" | "sbyte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong"
            | "float" | "double" | "decimal" => "number",
            "bool" => "boolean",
            "object" => "any",
            _ => return None,
        };
        Some(ts)
    }
}

impl TypeFormatter for TypeScriptFormatter {
    fn target(&self) -> Target {
        Target::TypeScript
    }

    fn format(&self, canonical: &str, flags: TypeFlags) -> String {
        self.format_meta(&describe(canonical, flags))
    }

    fn format_meta(&self, meta: &TypeMeta) -> String {
        let base = if let Some(element) = meta.element() {
            let inner = self.format_meta(element);
            if inner.contains(' ') {
                format!("({})[]", inner)
            } else {
                format!("{}[]", inner)
            }
        } else if let Some(value) = meta.value_type() {
            format!("Record<string, {}>", self.format_meta(value))
        } else if meta.is_enum {
            meta.name.clone()
        } else if meta.is_generic() {
            let params: Vec<String> = meta
                .generic_params
                .iter()
                .map(|p| self.format_meta(p))
                .collect();
            format!("{}<{}>", meta.name, params.join(", "))
        } else {
            Self::primitive(&meta.name)
                .map(str::to_string)
                .unwrap_or_else(|| meta.name.clone())
        };

        if meta.is_nullable && !base.ends_with(NULL_MARKER) {
            format!("{}{}", base, NULL_MARKER)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(is_enum: bool, is_list: bool, is_nullable: bool) -> TypeFlags {
        TypeFlags {
            is_enum,
            is_list,
            is_nullable,
        }
    }

    #[test]
    fn test_primitives() {
        let f = TypeScriptFormatter;
        assert_eq!(f.format("string", TypeFlags::default()), "string");
        assert_eq!(f.format("Guid", TypeFlags::default()), "string");
        assert_eq!(f.format("DateTime", TypeFlags::default()), "string");
        assert_eq!(f.format("int", TypeFlags::default()), "number");
        assert_eq!(f.format("decimal", TypeFlags::default()), "number");
        assert_eq!(f.format("bool", TypeFlags::default()), "boolean");
        assert_eq!(f.format("object", TypeFlags::default()), "any");
    }

    #[test]
    fn test_dictionary() {
        let f = TypeScriptFormatter;
        assert_eq!(
            f.format("Dictionary<string, User>", TypeFlags::default()),
            "Record<string, User>"
        );
        assert_eq!(
            f.format("Dictionary<string, User>", flags(false, false, true)),
            "Record<string, User> | null"
        );
        assert_eq!(
            f.format("Dictionary<int, List<int>>", TypeFlags::default()),
            "Record<string, number[]>"
        );
    }

    #[test]
    fn test_lists() {
        let f = TypeScriptFormatter;
        for (canonical, element) in [("int", "number"), ("string", "string"), ("bool", "boolean")] {
            assert_eq!(
                f.format(&format!("List<{}>", canonical), TypeFlags::default()),
                format!("{}[]", f.format(canonical, TypeFlags::default()))
            );
            assert_eq!(
                f.format(canonical, flags(false, true, false)),
                format!("{}[]", element)
            );
        }
        assert_eq!(f.format("List<int?>", TypeFlags::default()), "(number | null)[]");
        assert_eq!(f.format("Order[]", flags(false, true, true)), "Order[] | null");
    }

    #[test]
    fn test_enums_and_references() {
        let f = TypeScriptFormatter;
        assert_eq!(f.format("PostStatus", flags(true, false, false)), "PostStatus");
        assert_eq!(f.format("List<PostStatus>", flags(true, true, false)), "PostStatus[]");
        // Unknown names pass through as references
        assert_eq!(f.format("Customer", TypeFlags::default()), "Customer");
        assert_eq!(f.format("Page<List<Order>>", TypeFlags::default()), "Page<Order[]>");
    }

    #[test]
    fn test_nullable_not_doubled() {
        let f = TypeScriptFormatter;
        assert_eq!(f.format("string?", flags(false, false, true)), "string | null");
    }
}
