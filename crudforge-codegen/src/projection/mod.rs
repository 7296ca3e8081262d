//! Canonical type to target-language type projection
//!
//! Each supported language has one formatter value implementing
//! [`TypeFormatter`]; the [`Target`] enum selects it. Formatters share no
//! state, and unknown type names pass through unchanged so that
//! entity-to-entity references resolve by name.

mod csharp;
mod rust;
mod typescript;

pub use csharp::CSharpFormatter;
pub use rust::RustFormatter;
pub use typescript::TypeScriptFormatter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::model::TypeMeta;

/// Shape flags accompanying a canonical type name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFlags {
    pub is_enum: bool,
    pub is_list: bool,
    pub is_nullable: bool,
}

impl TypeFlags {
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }
}

/// Renders canonical types into one target language's syntax
pub trait TypeFormatter: Send + Sync {
    /// The language this formatter renders
    fn target(&self) -> Target;

    /// Render a canonical type string with explicit shape flags
    fn format(&self, canonical: &str, flags: TypeFlags) -> String;

    /// Render a parsed type descriptor
    fn format_meta(&self, meta: &TypeMeta) -> String;
}

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[serde(alias = "cs", alias = "c#")]
    CSharp,
    #[serde(alias = "ts")]
    TypeScript,
    #[serde(alias = "rs")]
    Rust,
}

impl Target {
    /// The formatter for this language
    pub fn formatter(self) -> &'static dyn TypeFormatter {
        match self {
            Target::CSharp => &CSharpFormatter,
            Target::TypeScript => &TypeScriptFormatter,
            Target::Rust => &RustFormatter,
        }
    }

    /// Source file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Target::CSharp => "cs",
            Target::TypeScript => "ts",
            Target::Rust => "rs",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::CSharp => "csharp",
            Target::TypeScript => "typescript",
            Target::Rust => "rust",
        };
        f.write_str(name)
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csharp" | "cs" | "c#" => Ok(Target::CSharp),
            "typescript" | "ts" => Ok(Target::TypeScript),
            "rust" | "rs" => Ok(Target::Rust),
            other => Err(format!("unknown target language `{}`", other)),
        }
    }
}

/// Combine a canonical type string with shape flags into one descriptor.
///
/// Arity markers and qualifiers are stripped by the parser. A string that does
/// not parse is kept verbatim as an opaque reference.
pub fn describe(canonical: &str, flags: TypeFlags) -> TypeMeta {
    let mut meta = match TypeMeta::parse(canonical) {
        Ok(meta) => meta,
        Err(err) => {
            debug!("Passing type through unchanged: {}", err);
            TypeMeta::reference(canonical.trim())
        }
    };

    if flags.is_list && !meta.is_list() {
        let element = std::mem::replace(&mut meta, TypeMeta::primitive("object"));
        meta = TypeMeta::list(element.with_nullable(false));
    }
    if flags.is_enum {
        let inner = meta.innermost_mut();
        inner.is_enum = true;
        inner.is_reference = true;
        inner.generic_params.clear();
    }
    if flags.is_nullable {
        meta.is_nullable = true;
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_wraps_list_flag() {
        let meta = describe("Order", TypeFlags { is_list: true, ..Default::default() });
        assert!(meta.is_list());
        assert_eq!(meta.element().unwrap().name, "Order");

        // Already list-shaped types are not wrapped twice
        let meta = describe("List<Order>", TypeFlags { is_list: true, ..Default::default() });
        assert_eq!(meta.to_string(), "List<Order>");
    }

    #[test]
    fn test_describe_marks_enum_element() {
        let meta = describe(
            "List<Status>",
            TypeFlags {
                is_enum: true,
                is_list: true,
                is_nullable: false,
            },
        );
        assert!(meta.element().unwrap().is_enum);
        assert!(!meta.is_enum);
    }

    #[test]
    fn test_describe_strips_arity() {
        let meta = describe("Status`1", TypeFlags { is_enum: true, ..Default::default() });
        assert_eq!(meta.name, "Status");
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!("ts".parse::<Target>().unwrap(), Target::TypeScript);
        assert_eq!("CSharp".parse::<Target>().unwrap(), Target::CSharp);
        assert!("cobol".parse::<Target>().is_err());
        assert_eq!(Target::Rust.to_string(), "rust");
    }
}
