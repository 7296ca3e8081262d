//! Declaration adapter: class declarations with attributes to entities

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::SourceAdapter;
use crate::error::ParseFailure;
use crate::model::{EntityInfo, EntityNavigation, PropertyInfo, TypeMeta};

/// Whether a declaration is a class or an enum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    #[default]
    Class,
    Enum,
}

/// A parsed class (or enum) declaration with its symbol information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub kind: DeclarationKind,
    /// Name of the base class, resolved through the adapter's declarations
    #[serde(default)]
    pub base: Option<String>,
    /// Doc comment, either plain text or XML (`<summary>...</summary>`)
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    /// Enum member names
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(skip)]
    pub file_path: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    /// Type expression as written, e.g. `ICollection<Order>` or `string?`
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub has_setter: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// An attribute application such as `[StringLength(50, MinimumLength = 2)]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    /// Positional arguments, string literals unquoted
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub named: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl ClassDeclaration {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            module: None,
            kind: DeclarationKind::Class,
            base: None,
            comment: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            members: Vec::new(),
            file_path: None,
        }
    }

    pub fn is_enum(&self) -> bool {
        self.kind == DeclarationKind::Enum
    }
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_public: true,
            has_setter: true,
            is_static: false,
            attributes: Vec::new(),
            comment: None,
            default_value: None,
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }

    fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        find_attribute(&self.attributes, name)
    }
}

impl AttributeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.arguments = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_named(mut self, name: &str, value: &str) -> Self {
        self.named.insert(name.to_string(), value.to_string());
        self
    }

    /// Short name: qualifiers and the `Attribute` suffix removed
    pub fn short_name(&self) -> &str {
        let name = self.name.rsplit(['.', ':']).next().unwrap_or(&self.name);
        name.strip_suffix("Attribute").unwrap_or(name)
    }

    fn number(&self, index: usize) -> Option<u32> {
        self.arguments.get(index).and_then(|a| a.trim().parse().ok())
    }

    fn named_number(&self, name: &str) -> Option<u32> {
        self.named.get(name).and_then(|a| a.trim().parse().ok())
    }
}

fn find_attribute<'a>(attributes: &'a [AttributeDecl], name: &str) -> Option<&'a AttributeDecl> {
    attributes.iter().find(|a| a.short_name() == name)
}

/// Turns declarations into entities using the declarations seen in the same run
#[derive(Debug, Clone, Default)]
pub struct DeclarationAdapter {
    declarations: BTreeMap<String, ClassDeclaration>,
    enum_types: BTreeSet<String>,
    entity_types: BTreeSet<String>,
}

impl DeclarationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from every declaration of a run; classes become
    /// entity types and enums enum types
    pub fn from_declarations<'a>(declarations: impl IntoIterator<Item = &'a ClassDeclaration>) -> Self {
        let mut adapter = Self::new();
        for decl in declarations {
            adapter.register(decl.clone());
        }
        adapter
    }

    pub fn register(&mut self, declaration: ClassDeclaration) {
        if declaration.is_enum() {
            self.enum_types.insert(declaration.name.clone());
        } else {
            self.entity_types.insert(declaration.name.clone());
        }
        self.declarations
            .insert(declaration.name.clone(), declaration);
    }

    /// Mark a type name as an enum without a declaration
    pub fn with_enum(mut self, name: impl Into<String>) -> Self {
        self.enum_types.insert(name.into());
        self
    }

    /// Mark a type name as an entity without a declaration
    pub fn with_entity(mut self, name: impl Into<String>) -> Self {
        self.entity_types.insert(name.into());
        self
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enum_types.contains(name)
    }

    pub fn is_entity(&self, name: &str) -> bool {
        self.entity_types.contains(name)
    }

    pub fn declaration(&self, name: &str) -> Option<&ClassDeclaration> {
        self.declarations.get(name)
    }

    /// Declared classes in name order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.declarations.values().filter(|d| !d.is_enum())
    }

    /// The declaration followed by its bases, root last
    fn base_chain<'a>(&'a self, decl: &'a ClassDeclaration) -> Result<Vec<&'a ClassDeclaration>, ParseFailure> {
        let mut chain = vec![decl];
        let mut seen = BTreeSet::from([decl.name.as_str()]);
        let mut current = decl;
        while let Some(base) = current.base.as_deref() {
            let base = base.rsplit('.').next().unwrap_or(base);
            let Some(next) = self.declarations.get(base) else {
                // Framework base classes carry no mapped properties
                debug!("Base type {} of {} not declared, stopping", base, current.name);
                break;
            };
            if !seen.insert(next.name.as_str()) {
                return Err(failure(decl, format!("cyclic base chain through `{}`", base)));
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    fn classify(&self, decl: &ClassDeclaration, prop: &PropertyDecl) -> Result<PropertyInfo, ParseFailure> {
        let mut meta = TypeMeta::parse(&prop.type_name).map_err(|e| {
            failure(decl, format!("property `{}`: {}", prop.name, e))
        })?;
        let inner = meta.innermost_mut();
        let inner_name = inner.name.clone();
        if self.is_enum(&inner_name) {
            inner.is_enum = true;
            inner.is_reference = true;
        }

        let mut info = PropertyInfo::from_type(prop.name.clone(), &meta);
        info.is_navigation = self.is_entity(&inner_name) && !info.is_dictionary;
        info.is_complex_type = meta.innermost().is_reference
            && !info.is_enum
            && !info.is_navigation
            && !self.is_entity(&inner_name);
        info.default_value = prop.default_value.clone();
        if let Some(comment) = &prop.comment {
            info.comment_summary = summary_text(comment);
            info.comment_xml = Some(comment.clone());
        }

        for attr in &prop.attributes {
            match attr.short_name() {
                "Required" => info.is_required = true,
                "Key" => info.is_key = true,
                "Index" => info.is_indexed = true,
                "MaxLength" => info.max_length = attr.number(0),
                "MinLength" => info.min_length = attr.number(0),
                "StringLength" => {
                    info.max_length = attr.number(0);
                    if let Some(min) = attr.named_number("MinimumLength") {
                        info.min_length = Some(min);
                    }
                }
                "Length" => {
                    info.min_length = attr.number(0);
                    info.max_length = attr.number(1);
                }
                _ => {}
            }
        }
        Ok(info)
    }

    fn navigations(&self, props: &[&PropertyDecl], entity: &mut EntityInfo) {
        for prop in props {
            let Some(info) = entity.property(&prop.name) else {
                continue;
            };
            if !info.is_navigation {
                continue;
            }
            let is_collection = info.is_list;
            let type_name = info.element_type_name();
            let foreign_key = prop
                .attribute("ForeignKey")
                .and_then(|a| a.arguments.first().cloned())
                .or_else(|| {
                    // [ForeignKey("Customer")] on the scalar side
                    props
                        .iter()
                        .find(|p| {
                            p.attribute("ForeignKey")
                                .and_then(|a| a.arguments.first())
                                .is_some_and(|n| *n == prop.name)
                        })
                        .map(|p| p.name.clone())
                })
                .or_else(|| {
                    let sibling = format!("{}Id", prop.name);
                    (!is_collection && entity.property(&sibling).is_some()).then_some(sibling)
                });

            let is_required = !is_collection
                && (info.is_required
                    || foreign_key
                        .as_deref()
                        .and_then(|fk| entity.property(fk))
                        .is_some_and(|fk| !fk.is_nullable && fk.type_meta().is_value_type()));

            entity.navigations.push(EntityNavigation {
                name: prop.name.clone(),
                type_name,
                foreign_key: if is_collection { None } else { foreign_key },
                is_required,
                is_collection,
                is_skip_navigation: false,
            });
        }
    }
}

impl SourceAdapter for DeclarationAdapter {
    type Input = ClassDeclaration;

    fn extract(&self, decl: &ClassDeclaration) -> Result<EntityInfo, ParseFailure> {
        if decl.is_enum() {
            return Err(failure(decl, format!("`{}` is an enum, not an entity", decl.name)));
        }
        let mut chain = self.base_chain(decl)?;
        chain.reverse();

        // Root first; a derived property hides the base one in place
        let mut visible: Vec<&PropertyDecl> = Vec::new();
        for class in &chain {
            for prop in &class.properties {
                match visible.iter().position(|p| p.name == prop.name) {
                    Some(i) => visible[i] = prop,
                    None => visible.push(prop),
                }
            }
        }
        visible.retain(|p| {
            p.is_public
                && p.has_setter
                && !p.is_static
                && p.attribute("NotMapped").is_none()
                && p.attribute("JsonIgnore").is_none()
        });

        let mut entity = EntityInfo::new(decl.name.clone(), decl.namespace.clone());
        entity.module_name = decl.module.clone().filter(|m| !m.is_empty());
        entity.file_path = decl.file_path.clone();
        entity.comment = decl.comment.as_deref().and_then(summary_text);

        for prop in &visible {
            let info = self.classify(decl, prop)?;
            entity.add_property(info)?;
        }

        for class in &chain {
            for index in class.attributes.iter().filter(|a| a.short_name() == "Index") {
                for column in &index.arguments {
                    match entity.property_mut(column) {
                        Some(prop) => prop.is_indexed = true,
                        None => debug!("Index column {} not on {}", column, decl.name),
                    }
                }
            }
        }

        self.navigations(&visible, &mut entity);
        entity.validate()?;
        Ok(entity)
    }
}

fn failure(decl: &ClassDeclaration, reason: String) -> ParseFailure {
    let path = decl
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| decl.name.clone());
    ParseFailure::new(path, reason)
}

/// Text of the `<summary>` element of an XML doc comment, or the whole
/// comment when it has none; whitespace collapsed
pub fn summary_text(comment: &str) -> Option<String> {
    let text = match (comment.find("<summary>"), comment.find("</summary>")) {
        (Some(start), Some(end)) if end > start => &comment[start + "<summary>".len()..end],
        _ => comment,
    };
    let text = text
        .lines()
        .map(|l| l.trim().trim_start_matches("///").trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
