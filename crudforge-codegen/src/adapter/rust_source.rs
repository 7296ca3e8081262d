//! Rust source front end: `struct` and `enum` items to declarations

use heck::ToUpperCamelCase;
use std::path::Path;
use syn::{Attribute, Fields, GenericArgument, Item, PathArguments, Type, Visibility};

use super::declaration::{AttributeDecl, ClassDeclaration, DeclarationKind, PropertyDecl};
use crate::error::ParseFailure;

/// Struct-level `#[crud(...)]` settings
#[derive(Default)]
struct ItemConfig {
    namespace: Option<String>,
    module: Option<String>,
    skip: bool,
}

/// Parse a Rust source file into declarations.
///
/// Structs with named fields become classes, enums become enum declarations;
/// other items are ignored.
pub fn parse_rust_source(source: &str, path: &Path) -> Result<Vec<ClassDeclaration>, ParseFailure> {
    let file = syn::parse_file(source).map_err(|e| failure(path, e))?;
    let mut declarations = Vec::new();

    for item in &file.items {
        match item {
            Item::Struct(item) => {
                let config = parse_item_config(&item.attrs).map_err(|e| failure(path, e))?;
                if config.skip {
                    continue;
                }
                let Fields::Named(fields) = &item.fields else {
                    continue;
                };
                let mut decl = ClassDeclaration::new(item.ident.to_string(), config.namespace.unwrap_or_default());
                decl.module = config.module;
                decl.comment = doc_comment(&item.attrs);
                decl.file_path = Some(path.to_path_buf());
                for field in &fields.named {
                    let Some(ident) = &field.ident else {
                        continue;
                    };
                    let raw = ident.to_string();
                    let name = raw.trim_start_matches("r#").to_upper_camel_case();
                    let type_name = type_text(&field.ty).ok_or_else(|| {
                        ParseFailure::new(
                            path.display().to_string(),
                            format!("unsupported type on `{}::{}`", decl.name, raw),
                        )
                    })?;
                    let mut prop = PropertyDecl::new(name, type_name);
                    prop.is_public = matches!(field.vis, Visibility::Public(_));
                    prop.comment = doc_comment(&field.attrs);
                    prop.attributes = parse_field_attributes(&field.attrs).map_err(|e| failure(path, e))?;
                    decl.properties.push(prop);
                }
                declarations.push(decl);
            }
            Item::Enum(item) => {
                let config = parse_item_config(&item.attrs).map_err(|e| failure(path, e))?;
                if config.skip {
                    continue;
                }
                let mut decl = ClassDeclaration::new(item.ident.to_string(), config.namespace.unwrap_or_default());
                decl.kind = DeclarationKind::Enum;
                decl.module = config.module;
                decl.comment = doc_comment(&item.attrs);
                decl.file_path = Some(path.to_path_buf());
                decl.members = item.variants.iter().map(|v| v.ident.to_string()).collect();
                declarations.push(decl);
            }
            _ => {}
        }
    }

    Ok(declarations)
}

fn failure(path: &Path, err: syn::Error) -> ParseFailure {
    ParseFailure::new(path.display().to_string(), err.to_string())
}

fn parse_item_config(attrs: &[Attribute]) -> syn::Result<ItemConfig> {
    let mut config = ItemConfig::default();
    for attr in attrs {
        if !attr.path().is_ident("crud") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("namespace") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                config.namespace = Some(lit.value());
            } else if meta.path.is_ident("module") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                config.module = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                config.skip = true;
            } else {
                return Err(meta.error(format!(
                    "unknown crud attribute `{}`",
                    meta.path
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default()
                )));
            }
            Ok(())
        })?;
    }
    Ok(config)
}

/// Translate `#[crud(...)]` and `#[serde(skip)]` on a field into attributes
fn parse_field_attributes(attrs: &[Attribute]) -> syn::Result<Vec<AttributeDecl>> {
    let mut out = Vec::new();
    for attr in attrs {
        if attr.path().is_ident("serde") {
            // Other serde keys are irrelevant here
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    out.push(AttributeDecl::new("JsonIgnore"));
                }
                if meta.input.peek(syn::Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                }
                Ok(())
            });
            continue;
        }
        if !attr.path().is_ident("crud") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let attribute = if meta.path.is_ident("required") {
                AttributeDecl::new("Required")
            } else if meta.path.is_ident("key") {
                AttributeDecl::new("Key")
            } else if meta.path.is_ident("index") {
                AttributeDecl::new("Index")
            } else if meta.path.is_ident("skip") {
                AttributeDecl::new("NotMapped")
            } else if meta.path.is_ident("max_length") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                let value = lit.base10_parse::<u32>()?.to_string();
                AttributeDecl::new("MaxLength").with_args(&[value.as_str()])
            } else if meta.path.is_ident("min_length") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                let value = lit.base10_parse::<u32>()?.to_string();
                AttributeDecl::new("MinLength").with_args(&[value.as_str()])
            } else if meta.path.is_ident("foreign_key") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                AttributeDecl::new("ForeignKey").with_args(&[lit.value().as_str()])
            } else {
                return Err(meta.error(format!(
                    "unknown crud attribute `{}`",
                    meta.path
                        .get_ident()
                        .map(|i| i.to_string())
                        .unwrap_or_default()
                )));
            };
            out.push(attribute);
            Ok(())
        })?;
    }
    Ok(out)
}

/// Joined `///` lines, or `None` without doc comments
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    if lines.iter().all(|l| l.is_empty()) {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Render a field type as a type expression `TypeMeta::parse` accepts
fn type_text(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => {
            let mut segments = Vec::new();
            for segment in &type_path.path.segments {
                let mut text = segment.ident.to_string();
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    let params: Vec<String> = args
                        .args
                        .iter()
                        .filter_map(|arg| match arg {
                            GenericArgument::Type(t) => Some(type_text(t)),
                            _ => None,
                        })
                        .collect::<Option<Vec<_>>>()?;
                    if !params.is_empty() {
                        text.push_str(&format!("<{}>", params.join(", ")));
                    }
                }
                segments.push(text);
            }
            Some(segments.join("::"))
        }
        Type::Reference(reference) => type_text(&reference.elem),
        Type::Paren(paren) => type_text(&paren.elem),
        Type::Group(group) => type_text(&group.elem),
        Type::Array(array) => Some(format!("{}[]", type_text(&array.elem)?)),
        Type::Slice(slice) => Some(format!("{}[]", type_text(&slice.elem)?)),
        _ => None,
    }
}
