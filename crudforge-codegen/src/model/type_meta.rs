//! Canonical type descriptors and the named-type arena

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Canonical name of every list-shaped type
pub const LIST: &str = "List";

/// Canonical name of every map-shaped type
pub const DICTIONARY: &str = "Dictionary";

/// Wrappers that take one generic argument and behave like a list
const LIST_WRAPPERS: &[&str] = &[
    "List",
    "IList",
    "ICollection",
    "IEnumerable",
    "IReadOnlyList",
    "IReadOnlyCollection",
    "Collection",
    "ObservableCollection",
    "HashSet",
    "ISet",
    "SortedSet",
    "LinkedList",
    "Vec",
    "VecDeque",
    "BTreeSet",
];

/// Wrappers that take two generic arguments and behave like a map
const MAP_WRAPPERS: &[&str] = &[
    "Dictionary",
    "IDictionary",
    "IReadOnlyDictionary",
    "SortedDictionary",
    "ConcurrentDictionary",
    "HashMap",
    "BTreeMap",
    "IndexMap",
    "Map",
    "Record",
];

/// Wrappers that only add nullability to their single argument
const NULLABLE_WRAPPERS: &[&str] = &["Nullable", "Option"];

/// Map a primitive spelling (C#, CLR or Rust) to its canonical name.
///
/// Returns `None` for anything that is not a known primitive; such names are
/// treated as references to other generated types.
pub fn canonical_primitive(name: &str) -> Option<&'static str> {
    let canonical = match name {
        "string" | "String" | "str" => "string",
        "char" | "Char" => "char",
        "bool" | "Boolean" => "bool",
        "byte" | "Byte" | "u8" => "byte",
        "sbyte" | "SByte" | "i8" => "sbyte",
        "short" | "Int16" | "i16" => "short",
        "ushort" | "UInt16" | "u16" => "ushort",
        "int" | "Int32" | "i32" => "int",
        "uint" | "UInt32" | "u32" => "uint",
        "long" | "Int64" | "i64" | "isize" => "long",
        "ulong" | "UInt64" | "u64" | "usize" => "ulong",
        "float" | "Single" | "f32" => "float",
        "double" | "Double" | "f64" => "double",
        "decimal" | "Decimal" => "decimal",
        "Guid" | "Uuid" => "Guid",
        "DateTime" | "NaiveDateTime" => "DateTime",
        "DateTimeOffset" => "DateTimeOffset",
        "DateOnly" | "NaiveDate" => "DateOnly",
        "TimeOnly" | "NaiveTime" => "TimeOnly",
        "TimeSpan" | "Duration" => "TimeSpan",
        "object" | "Object" | "dynamic" | "Value" => "object",
        _ => return None,
    };
    Some(canonical)
}

/// Check if a canonical primitive is a value type (cannot hold null without a marker)
pub fn is_value_primitive(name: &str) -> bool {
    matches!(canonical_primitive(name), Some(p) if p != "string" && p != "object")
}

/// Error produced when a type expression cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type expression `{input}` at offset {offset}: {message}")]
pub struct TypeParseError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

/// Language-neutral type descriptor.
///
/// Named types (entities, enums, schema objects) are only ever held by name,
/// so a cyclic model never produces a cyclic value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeMeta {
    /// Canonical name: a primitive (`string`, `int`), `List`, `Dictionary`,
    /// or the name of another type
    pub name: String,

    /// Generic arguments, in declaration order
    #[serde(default)]
    pub generic_params: Vec<TypeMeta>,

    /// Whether this names another (possibly cyclic) type
    #[serde(default)]
    pub is_reference: bool,

    /// Whether this names an enum
    #[serde(default)]
    pub is_enum: bool,

    /// Whether the value may be null
    #[serde(default)]
    pub is_nullable: bool,
}

impl TypeMeta {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_params: Vec::new(),
            is_reference: false,
            is_enum: false,
            is_nullable: false,
        }
    }

    /// A primitive; non-canonical spellings are normalized
    pub fn primitive(name: &str) -> Self {
        Self::named(canonical_primitive(name).unwrap_or(name))
    }

    /// A reference to another named type
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            is_reference: true,
            ..Self::named(name)
        }
    }

    /// A reference to a named enum
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            is_reference: true,
            is_enum: true,
            ..Self::named(name)
        }
    }

    /// `List<element>`
    pub fn list(element: TypeMeta) -> Self {
        Self {
            generic_params: vec![element],
            ..Self::named(LIST)
        }
    }

    /// `Dictionary<key, value>`
    pub fn dictionary(key: TypeMeta, value: TypeMeta) -> Self {
        Self {
            generic_params: vec![key, value],
            ..Self::named(DICTIONARY)
        }
    }

    /// A named generic instantiation such as `Page<Order>`
    pub fn generic(name: impl Into<String>, params: Vec<TypeMeta>) -> Self {
        Self {
            generic_params: params,
            is_reference: true,
            ..Self::named(name)
        }
    }

    /// Set the nullable flag
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    pub fn is_list(&self) -> bool {
        self.name == LIST && self.generic_params.len() == 1
    }

    pub fn is_dictionary(&self) -> bool {
        self.name == DICTIONARY && self.generic_params.len() == 2
    }

    /// Whether this is a known primitive
    pub fn is_primitive(&self) -> bool {
        !self.is_generic() && !self.is_enum && canonical_primitive(&self.name).is_some()
    }

    /// Whether values of this type need an explicit marker to be nullable
    pub fn is_value_type(&self) -> bool {
        self.is_enum || (!self.is_generic() && is_value_primitive(&self.name))
    }

    /// Element type of a list
    pub fn element(&self) -> Option<&TypeMeta> {
        if self.is_list() {
            self.generic_params.first()
        } else {
            None
        }
    }

    /// Value type of a dictionary
    pub fn value_type(&self) -> Option<&TypeMeta> {
        if self.is_dictionary() {
            self.generic_params.get(1)
        } else {
            None
        }
    }

    /// Innermost element: list elements and dictionary values are unwrapped
    pub fn innermost(&self) -> &TypeMeta {
        match self.element().or_else(|| self.value_type()) {
            Some(inner) => inner.innermost(),
            None => self,
        }
    }

    /// Mutable access to the innermost element
    pub fn innermost_mut(&mut self) -> &mut TypeMeta {
        let index = if self.is_list() {
            Some(0)
        } else if self.is_dictionary() {
            Some(1)
        } else {
            None
        };
        match index {
            Some(i) => self.generic_params[i].innermost_mut(),
            None => self,
        }
    }

    /// Canonical rendering without the top-level nullable marker
    pub fn canonical_name(&self) -> String {
        let mut text = self.to_string();
        if self.is_nullable {
            text.pop();
        }
        text
    }

    /// Collect the names of every referenced named type
    pub fn collect_references(&self, out: &mut BTreeSet<String>) {
        if self.is_reference {
            out.insert(self.name.clone());
        }
        for param in &self.generic_params {
            param.collect_references(out);
        }
    }

    /// Parse a canonical or source-language type expression.
    ///
    /// Accepts `List<T>`, `T[]`, `T?`, `Nullable<T>`, `Dictionary<K, V>`,
    /// arity markers (``List`1``), qualified names and the Rust spellings
    /// `Vec<T>`, `Option<T>`, `HashMap<K, V>`, `[T; N]`, `&str`.
    pub fn parse(input: &str) -> Result<Self, TypeParseError> {
        let mut parser = TypeParser {
            input,
            chars: input.chars().collect(),
            pos: 0,
        };
        let meta = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos < parser.chars.len() {
            return Err(parser.error("unexpected trailing characters"));
        }
        Ok(meta)
    }

    fn from_parts(name: &str, args: Vec<TypeMeta>) -> Self {
        let short = strip_qualifiers(name);
        let mut args = args;
        if NULLABLE_WRAPPERS.contains(&short) && args.len() == 1 {
            return args.remove(0).with_nullable(true);
        }
        if LIST_WRAPPERS.contains(&short) && args.len() == 1 {
            return Self::list(args.remove(0));
        }
        if MAP_WRAPPERS.contains(&short) && args.len() == 2 {
            let value = args.remove(1);
            let key = args.remove(0);
            return Self::dictionary(key, value);
        }
        if let Some(primitive) = canonical_primitive(short) {
            // DateTime<Utc> and friends carry no shape information
            return Self::named(primitive);
        }
        if args.is_empty() {
            Self::reference(short)
        } else {
            Self::generic(short, args)
        }
    }
}

impl fmt::Display for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_generic() {
            let params: Vec<String> = self.generic_params.iter().map(|p| p.to_string()).collect();
            write!(f, "<{}>", params.join(", "))?;
        }
        if self.is_nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}

/// Strip namespace/module qualifiers and generic-arity markers from a name.
///
/// `System.Collections.Generic.List`1` -> `List`, `std::vec::Vec` -> `Vec`
pub fn strip_qualifiers(name: &str) -> &str {
    let name = name.split('`').next().unwrap_or(name);
    name.rsplit(['.', ':']).next().unwrap_or(name)
}

struct TypeParser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl TypeParser<'_> {
    fn error(&self, message: &str) -> TypeParseError {
        TypeParseError {
            input: self.input.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", expected)))
        }
    }

    fn parse_ident(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '`'))
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_type(&mut self) -> Result<TypeMeta, TypeParseError> {
        if self.eat('&') {
            // Rust borrows: `&str`, `&'a str`, `&mut T`
            if self.eat('\'') {
                self.parse_ident();
            }
            self.skip_ws();
            let rest: String = self.chars[self.pos..].iter().take(4).collect();
            if rest == "mut " {
                self.pos += 4;
            }
        }

        let mut meta = if self.eat('[') {
            let element = self.parse_type()?;
            if self.eat(';') {
                while self.peek().is_some_and(|c| c != ']') {
                    self.pos += 1;
                }
            }
            self.expect(']')?;
            TypeMeta::list(element)
        } else {
            let name = self.parse_ident();
            if name.is_empty() {
                return Err(self.error("expected a type name"));
            }
            let mut args = Vec::new();
            if self.eat('<') {
                loop {
                    args.push(self.parse_type()?);
                    if !self.eat(',') {
                        break;
                    }
                }
                self.expect('>')?;
            }
            TypeMeta::from_parts(&name, args)
        };

        // Postfix markers apply left to right: `int?[]` is a list of nullable ints
        loop {
            if self.eat('?') {
                meta.is_nullable = true;
            } else if self.eat('[') {
                while self.eat(',') {}
                self.expect(']')?;
                meta = TypeMeta::list(meta);
            } else {
                break;
            }
        }
        Ok(meta)
    }
}

/// A property of a named object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyMeta {
    pub name: String,
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
}

/// One member of an enum definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Identifier-safe member name
    pub name: String,
    /// Raw value as it appears on the wire
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a named type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Object { properties: Vec<PropertyMeta> },
    Enum { members: Vec<EnumMember>, is_integer: bool },
}

/// A named type stored in the [`TypeTable`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub kind: TypeKind,
}

impl TypeDefinition {
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    /// Names of the types this definition refers to directly
    pub fn references(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if let TypeKind::Object { properties } = &self.kind {
            for prop in properties {
                prop.type_meta.collect_references(&mut out);
            }
        }
        out
    }
}

/// Flat arena of named types, keyed by name.
///
/// Nested types refer to each other by name only; walks over the table use a
/// visited set, so cycles terminate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTable {
    definitions: BTreeMap<String, TypeDefinition>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition; returns false if the name was already defined
    pub fn insert(&mut self, definition: TypeDefinition) -> bool {
        if self.definitions.contains_key(&definition.name) {
            return false;
        }
        self.definitions
            .insert(definition.name.clone(), definition);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.get(name).is_some_and(TypeDefinition::is_enum)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in name order
    pub fn iter(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.definitions.values()
    }

    /// Every defined type reachable from the given roots, including the roots' own names
    pub fn reachable<'a>(&self, roots: impl IntoIterator<Item = &'a TypeMeta>) -> BTreeSet<String> {
        let mut pending = BTreeSet::new();
        for root in roots {
            root.collect_references(&mut pending);
        }

        let mut visited = BTreeSet::new();
        let mut stack: Vec<String> = pending.into_iter().collect();
        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(def) = self.get(&name) {
                stack.extend(def.references().into_iter().filter(|r| !visited.contains(r)));
            }
        }
        visited.retain(|name| self.contains(name));
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        assert_eq!(TypeMeta::parse("string").unwrap(), TypeMeta::primitive("string"));
        assert_eq!(TypeMeta::parse("System.Int32").unwrap().name, "int");
        assert_eq!(TypeMeta::parse("i64").unwrap().name, "long");
        assert_eq!(TypeMeta::parse("&str").unwrap().name, "string");
        assert_eq!(TypeMeta::parse("DateTime<Utc>").unwrap().name, "DateTime");
    }

    #[test]
    fn test_parse_lists() {
        let meta = TypeMeta::parse("List<Order>").unwrap();
        assert!(meta.is_list());
        assert_eq!(meta.element().unwrap(), &TypeMeta::reference("Order"));

        let meta = TypeMeta::parse("System.Collections.Generic.IList`1<int>").unwrap();
        assert!(meta.is_list());
        assert_eq!(meta.element().unwrap().name, "int");

        let meta = TypeMeta::parse("Vec<String>").unwrap();
        assert_eq!(meta.to_string(), "List<string>");

        let meta = TypeMeta::parse("int[]").unwrap();
        assert!(meta.is_list());

        let meta = TypeMeta::parse("[u8; 16]").unwrap();
        assert_eq!(meta.to_string(), "List<byte>");
    }

    #[test]
    fn test_parse_nullability() {
        let meta = TypeMeta::parse("int?").unwrap();
        assert!(meta.is_nullable);
        assert_eq!(meta.canonical_name(), "int");

        let meta = TypeMeta::parse("Option<Vec<i32>>").unwrap();
        assert!(meta.is_nullable);
        assert!(meta.is_list());

        let meta = TypeMeta::parse("int?[]").unwrap();
        assert!(!meta.is_nullable);
        assert!(meta.element().unwrap().is_nullable);

        let meta = TypeMeta::parse("Nullable<Guid>").unwrap();
        assert_eq!(meta.to_string(), "Guid?");
    }

    #[test]
    fn test_parse_dictionary_and_generics() {
        let meta = TypeMeta::parse("Dictionary<string, List<Order>>").unwrap();
        assert!(meta.is_dictionary());
        assert!(meta.value_type().unwrap().is_list());
        assert_eq!(meta.innermost().name, "Order");

        let meta = TypeMeta::parse("HashMap<String, i32>").unwrap();
        assert_eq!(meta.to_string(), "Dictionary<string, int>");

        let meta = TypeMeta::parse("Page<List<Order>>").unwrap();
        assert!(meta.is_generic());
        assert!(meta.is_reference);
        assert_eq!(meta.to_string(), "Page<List<Order>>");

        let meta = TypeMeta::parse("TreeNode<TreeNode<T>>").unwrap();
        assert_eq!(meta.generic_params[0].generic_params[0].name, "T");
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeMeta::parse("").is_err());
        assert!(TypeMeta::parse("List<int").is_err());
        assert!(TypeMeta::parse("int>").is_err());
    }

    #[test]
    fn test_reachable_terminates_on_cycles() {
        let mut table = TypeTable::new();
        table.insert(TypeDefinition {
            name: "A".into(),
            comment: None,
            kind: TypeKind::Object {
                properties: vec![PropertyMeta {
                    name: "Bs".into(),
                    type_meta: TypeMeta::list(TypeMeta::reference("B")),
                    is_required: false,
                    comment: None,
                    max_length: None,
                    min_length: None,
                }],
            },
        });
        table.insert(TypeDefinition {
            name: "B".into(),
            comment: None,
            kind: TypeKind::Object {
                properties: vec![PropertyMeta {
                    name: "Owner".into(),
                    type_meta: TypeMeta::reference("A"),
                    is_required: false,
                    comment: None,
                    max_length: None,
                    min_length: None,
                }],
            },
        });

        let reached = table.reachable([&TypeMeta::reference("A")]);
        assert_eq!(reached.len(), 2);
        assert!(reached.contains("A") && reached.contains("B"));
    }
}
