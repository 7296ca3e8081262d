//! Naming utilities for code generation

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};

use crate::projection::Target;

/// Convert a table, schema or tag name to a type name (PascalCase)
pub fn to_type_name(name: &str) -> String {
    name.to_pascal_case()
}

/// Convert a column or field name to a canonical property name (PascalCase)
pub fn to_property_name(name: &str) -> String {
    name.to_pascal_case()
}

/// Generate an enum name for a column's ENUM type
/// e.g., table "users" + column "status" -> "UserStatus"
pub fn to_enum_name(entity_name: &str, column_name: &str) -> String {
    format!(
        "{}{}",
        entity_name.to_pascal_case(),
        column_name.to_pascal_case()
    )
}

/// Convert an enum value to a variant name
/// Handles cases like "ACTIVE", "active", "PendingReview", "IN_PROGRESS", "3"
pub fn to_enum_variant(value: &str) -> String {
    // Remove quotes if present
    let value = value.trim_matches('\'').trim_matches('"');

    let variant = value.to_pascal_case();
    if variant.is_empty() || variant.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Value{}", variant)
    } else {
        variant
    }
}

/// Property name as it appears in the target language
pub fn member_name(target: Target, name: &str) -> String {
    match target {
        Target::CSharp => escape_csharp_identifier(&name.to_pascal_case()),
        Target::TypeScript => name.to_lower_camel_case(),
        Target::Rust => escape_field_name(name),
    }
}

/// Parameter or local variable name in the target language
pub fn parameter_name(target: Target, name: &str) -> String {
    match target {
        Target::CSharp => escape_csharp_identifier(&name.to_lower_camel_case()),
        Target::TypeScript => name.to_lower_camel_case(),
        Target::Rust => escape_field_name(name),
    }
}

/// File stem for a generated type in the target language's file naming style
/// e.g., "BlogAddDto" -> "BlogAddDto" (C#), "blog-add-dto" (TS), "blog_add_dto" (Rust)
pub fn file_stem(target: Target, type_name: &str) -> String {
    match target {
        Target::CSharp => type_name.to_pascal_case(),
        Target::TypeScript => type_name.to_kebab_case(),
        Target::Rust => type_name.to_snake_case(),
    }
}

/// Directory name for a group of generated files in the target's style
pub fn dir_name(target: Target, name: &str) -> String {
    match target {
        Target::CSharp => name.to_string(),
        Target::TypeScript => name.to_kebab_case(),
        Target::Rust => name.to_snake_case(),
    }
}

/// Method name for an API operation.
///
/// Uses the operation id when present, otherwise the HTTP method followed by
/// the literal path segments: `GET /api/blogs/{id}` -> `getApiBlogs`.
pub fn operation_method_name(operation_id: Option<&str>, method: &str, path: &str) -> String {
    if let Some(id) = operation_id.filter(|id| !id.trim().is_empty()) {
        return id.to_lower_camel_case();
    }
    let mut parts = vec![method.to_lowercase()];
    for segment in path.split('/') {
        if segment.is_empty() || segment.starts_with('{') {
            continue;
        }
        parts.push(segment.to_string());
    }
    parts.join("_").to_lower_camel_case()
}

/// Pluralize a word using English grammar rules
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return word.to_string();
    }

    // Irregular plurals (common in database contexts)
    let irregulars: &[(&str, &str)] = &[
        ("person", "people"),
        ("child", "children"),
        ("man", "men"),
        ("woman", "women"),
        ("foot", "feet"),
        ("tooth", "teeth"),
        ("mouse", "mice"),
        ("index", "indices"),
    ];

    let lower = word.to_lowercase();
    for (singular, plural) in irregulars {
        if lower == *singular {
            return match_case(word, plural);
        }
    }

    // Words ending in -is → -es (analysis → analyses, basis → bases)
    if lower.ends_with("is") && word.len() > 2 {
        return format!("{}es", &word[..word.len() - 2]);
    }

    // Words ending in -fe → -ves (knife → knives)
    if let Some(stripped) = word.strip_suffix("fe") {
        return format!("{}ves", stripped);
    }

    // Standard rules: -s, -x, -z, -ch, -sh → add -es
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{}es", word);
    }

    // Words ending in consonant + y → -ies
    if lower.ends_with('y') && word.len() > 1 {
        let before_y = lower.chars().nth(lower.len() - 2).unwrap_or('_');
        if !"aeiou".contains(before_y) {
            return format!("{}ies", &word[..word.len() - 1]);
        }
    }

    // Default: just add -s
    format!("{}s", word)
}

/// Singularize a plural table name; the inverse of [`pluralize`] for common cases
pub fn singularize(word: &str) -> String {
    let irregulars: &[(&str, &str)] = &[
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("indices", "index"),
    ];
    let lower = word.to_lowercase();
    for (plural, singular) in irregulars {
        if lower == *plural {
            return match_case(word, singular);
        }
    }

    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if lower.ends_with("sses")
        || lower.ends_with("xes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
    {
        return word[..word.len() - 2].to_string();
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && word.len() > 1
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Keep the capitalization of the first letter of `original`
fn match_case(original: &str, replacement: &str) -> String {
    if original.starts_with(|c: char| c.is_uppercase()) {
        replacement.to_pascal_case()
    } else {
        replacement.to_string()
    }
}

/// Check if a name is a Rust reserved keyword
pub fn is_rust_keyword(name: &str) -> bool {
    matches!(
        name,
        "as" | "async"
            | "await"
            | "break"
            | "const"
            | "continue"
            | "crate"
            | "dyn"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "try"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

/// Escape a field name if it's a Rust keyword
pub fn escape_field_name(name: &str) -> String {
    let snake = name.to_snake_case();
    if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Check if a name is a reserved C# keyword
pub fn is_csharp_keyword(name: &str) -> bool {
    matches!(
        name,
        "abstract" | "as" | "base" | "bool" | "break" | "byte" | "case" | "catch" | "char"
            | "checked" | "class" | "const" | "continue" | "decimal" | "default" | "delegate"
            | "do" | "double" | "else" | "enum" | "event" | "explicit" | "extern" | "false"
            | "finally" | "fixed" | "float" | "for" | "foreach" | "goto" | "if" | "implicit"
            | "in" | "int" | "interface" | "internal" | "is" | "lock" | "long" | "namespace"
            | "new" | "null" | "object" | "operator" | "out" | "override" | "params"
            | "private" | "protected" | "public" | "readonly" | "ref" | "return" | "sbyte"
            | "sealed" | "short" | "sizeof" | "stackalloc" | "static" | "string" | "struct"
            | "switch" | "this" | "throw" | "true" | "try" | "typeof" | "uint" | "ulong"
            | "unchecked" | "unsafe" | "ushort" | "using" | "virtual" | "void" | "volatile"
            | "while"
    )
}

/// Escape a C# identifier with `@` if it is a keyword
pub fn escape_csharp_identifier(name: &str) -> String {
    if is_csharp_keyword(name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_type_name() {
        assert_eq!(to_type_name("users"), "Users");
        assert_eq!(to_type_name("user_settings"), "UserSettings");
        assert_eq!(to_type_name("order-items"), "OrderItems");
    }

    #[test]
    fn test_to_enum_name() {
        assert_eq!(to_enum_name("User", "status"), "UserStatus");
        assert_eq!(
            to_enum_name("order_items", "payment_type"),
            "OrderItemsPaymentType"
        );
    }

    #[test]
    fn test_to_enum_variant() {
        assert_eq!(to_enum_variant("ACTIVE"), "Active");
        assert_eq!(to_enum_variant("'active'"), "Active");
        assert_eq!(to_enum_variant("IN_PROGRESS"), "InProgress");
        assert_eq!(to_enum_variant("PendingReview"), "PendingReview");
        assert_eq!(to_enum_variant("3"), "Value3");
    }

    #[test]
    fn test_member_name() {
        assert_eq!(member_name(Target::CSharp, "user_id"), "UserId");
        assert_eq!(member_name(Target::TypeScript, "UserId"), "userId");
        assert_eq!(member_name(Target::Rust, "UserId"), "user_id");
        assert_eq!(member_name(Target::Rust, "Type"), "r#type");
        assert_eq!(parameter_name(Target::CSharp, "Event"), "@event");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Target::CSharp, "BlogAddDto"), "BlogAddDto");
        assert_eq!(file_stem(Target::TypeScript, "BlogAddDto"), "blog-add-dto");
        assert_eq!(file_stem(Target::Rust, "BlogAddDto"), "blog_add_dto");
    }

    #[test]
    fn test_operation_method_name() {
        assert_eq!(
            operation_method_name(Some("GetPetById"), "get", "/pets/{id}"),
            "getPetById"
        );
        assert_eq!(
            operation_method_name(None, "GET", "/api/blogs/{id}"),
            "getApiBlogs"
        );
    }

    #[test]
    fn test_pluralize() {
        // Basic -s
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("Post"), "Posts");

        // -es for -s, -x, -z, -ch, -sh
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");

        // -y → -ies (consonant + y)
        assert_eq!(pluralize("Category"), "Categories");
        // -y → -ys (vowel + y)
        assert_eq!(pluralize("key"), "keys");

        // -is → -es
        assert_eq!(pluralize("analysis"), "analyses");

        // Irregulars
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("Child"), "Children");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("post_tags"), "post_tag");
    }

    #[test]
    fn test_escape_field_name() {
        assert_eq!(escape_field_name("type"), "r#type");
        assert_eq!(escape_field_name("name"), "name");
        assert_eq!(escape_field_name("async"), "r#async");
    }
}
