//! Canonical to C# type mapping

use super::{describe, Target, TypeFlags, TypeFormatter};
use crate::model::TypeMeta;

/// Formats canonical types as C# type names
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpFormatter;

impl CSharpFormatter {
    fn primitive(name: &str) -> Option<&'static str> {
        let cs = match name {
            "string" => "string",
            "char" => "char",
            "bool" => "bool",
            "byte" => "byte",
            "sbyte" => "sbyte",
            "short" => "short",
            "ushort" => "ushort",
            "int" => "int",
            "uint" => "uint",
            "long" => "long",
            "ulong" => "ulong",
            "float" => "float",
            "double" => "double",
            "decimal" => "decimal",
            "Guid" => "Guid",
            "DateTime" => "DateTime",
            "DateTimeOffset" => "DateTimeOffset",
            "DateOnly" => "DateOnly",
            "TimeOnly" => "TimeOnly",
            "TimeSpan" => "TimeSpan",
            "object" => "object",
            _ => return None,
        };
        Some(cs)
    }
}

impl TypeFormatter for CSharpFormatter {
    fn target(&self) -> Target {
        Target::CSharp
    }

    fn format(&self, canonical: &str, flags: TypeFlags) -> String {
        self.format_meta(&describe(canonical, flags))
    }

    fn format_meta(&self, meta: &TypeMeta) -> String {
        let base = if let Some(element) = meta.element() {
            format!("List<{}>", self.format_meta(element))
        } else if let Some(value) = meta.value_type() {
            format!("Dictionary<string, {}>", self.format_meta(value))
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

        if meta.is_nullable && !base.ends_with('?') {
            format!("{}?", base)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        let f = CSharpFormatter;
        assert_eq!(f.format("string", TypeFlags::default()), "string");
        assert_eq!(f.format("System.Int32", TypeFlags::default()), "int");
        assert_eq!(f.format("i64", TypeFlags::default()), "long");
        assert_eq!(
            f.format("int", TypeFlags::default().nullable(true)),
            "int?"
        );
        assert_eq!(
            f.format("string?", TypeFlags::default().nullable(true)),
            "string?"
        );
    }

    #[test]
    fn test_collections() {
        let f = CSharpFormatter;
        assert_eq!(f.format("int[]", TypeFlags::default()), "List<int>");
        assert_eq!(f.format("Vec<String>", TypeFlags::default()), "List<string>");
        assert_eq!(
            f.format("IDictionary<string, Order>", TypeFlags::default()),
            "Dictionary<string, Order>"
        );
        assert_eq!(
            f.format(
                "Tag",
                TypeFlags {
                    is_list: true,
                    is_nullable: true,
                    ..Default::default()
                }
            ),
            "List<Tag>?"
        );
    }

    #[test]
    fn test_generic_reference() {
        let f = CSharpFormatter;
        assert_eq!(
            f.format("PageList`1<OrderItemDto>", TypeFlags::default()),
            "PageList<OrderItemDto>"
        );
    }
}
