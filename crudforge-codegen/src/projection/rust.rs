//! Canonical to Rust type mapping

use super::{describe, Target, TypeFlags, TypeFormatter};
use crate::model::TypeMeta;

/// Formats canonical types as Rust types
#[derive(Debug, Clone, Copy, Default)]
pub struct RustFormatter;

impl RustFormatter {
    fn primitive(name: &str) -> Option<&'static str> {
        let rs = match name {
            "string" => "String",
            "char" => "char",
            "bool" => "bool",
            "byte" => "u8",
            "sbyte" => "i8",
            "short" => "i16",
            "ushort" => "u16",
            "int" => "i32",
            "uint" => "u32",
            "long" => "i64",
            "ulong" => "u64",
            "float" => "f32",
            "double" => "f64",
            "decimal" => "rust_decimal::Decimal",
            "Guid" => "uuid::Uuid",
            "DateTime" | "DateTimeOffset" => "chrono::DateTime<chrono::Utc>",
            "DateOnly" => "chrono::NaiveDate",
            "TimeOnly" => "chrono::NaiveTime",
            "TimeSpan" => "std::time::Duration",
            "object" => "serde_json::Value",
            _ => return None,
        };
        Some(rs)
    }
}

impl TypeFormatter for RustFormatter {
    fn target(&self) -> Target {
        Target::Rust
    }

    fn format(&self, canonical: &str, flags: TypeFlags) -> String {
        self.format_meta(&describe(canonical, flags))
    }

    fn format_meta(&self, meta: &TypeMeta) -> String {
        let base = if let Some(element) = meta.element() {
            format!("Vec<{}>", self.format_meta(element))
        } else if let Some(value) = meta.value_type() {
            format!(
                "std::collections::HashMap<String, {}>",
                self.format_meta(value)
            )
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

        if meta.is_nullable && !base.starts_with("Option<") {
            format!("Option<{}>", base)
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_strings() {
        let f = RustFormatter;
        assert_eq!(f.format("long", TypeFlags::default()), "i64");
        assert_eq!(
            f.format("string", TypeFlags::default().nullable(true)),
            "Option<String>"
        );
        assert_eq!(f.format("DateTime", TypeFlags::default()), "chrono::DateTime<chrono::Utc>");
        assert_eq!(f.format("decimal", TypeFlags::default()), "rust_decimal::Decimal");
    }

    #[test]
    fn test_shapes() {
        let f = RustFormatter;
        assert_eq!(f.format("List<int>", TypeFlags::default()), "Vec<i32>");
        assert_eq!(
            f.format("Dictionary<string, User>", TypeFlags::default()),
            "std::collections::HashMap<String, User>"
        );
        assert_eq!(
            f.format("Option<i32>", TypeFlags::default().nullable(true)),
            "Option<i32>"
        );
    }
}
