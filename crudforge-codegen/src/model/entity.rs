//! Entity, property and navigation records

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::type_meta::TypeMeta;
use crate::error::ParseFailure;

/// One analyzed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Entity name, unique within a generation run
    pub name: String,

    /// Namespace of the entity declaration
    #[serde(default)]
    pub namespace_name: String,

    /// Module the entity belongs to; nests DTO and manager namespaces
    #[serde(default)]
    pub module_name: Option<String>,

    /// Source file the entity was read from (diagnostics only)
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Summary comment of the entity
    #[serde(default)]
    pub comment: Option<String>,

    /// Properties in declaration order
    #[serde(default)]
    pub property_infos: Vec<PropertyInfo>,

    /// Relationships to other entities
    #[serde(default)]
    pub navigations: Vec<EntityNavigation>,
}

/// One field of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub name: String,

    /// Canonical type, e.g. `string`, `List<Order>`, `Dictionary<string, int>`
    pub type_name: String,

    #[serde(default)]
    pub is_list: bool,
    #[serde(default)]
    pub is_dictionary: bool,
    /// For lists and dictionaries this refers to the element type
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_navigation: bool,
    #[serde(default)]
    pub is_complex_type: bool,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default)]
    pub is_indexed: bool,

    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub default_value: Option<String>,

    #[serde(default)]
    pub comment_summary: Option<String>,
    #[serde(default)]
    pub comment_xml: Option<String>,
}

/// A relationship from one entity to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNavigation {
    pub name: String,

    /// Name of the related entity
    pub type_name: String,

    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_collection: bool,
    /// Many-to-many navigation through a join entity
    #[serde(default)]
    pub is_skip_navigation: bool,
}

impl EntityInfo {
    pub fn new(name: impl Into<String>, namespace_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace_name: namespace_name.into(),
            module_name: None,
            file_path: None,
            comment: None,
            property_infos: Vec::new(),
            navigations: Vec::new(),
        }
    }

    /// Append a property, rejecting duplicate names
    pub fn add_property(&mut self, property: PropertyInfo) -> Result<(), ParseFailure> {
        if self.property(&property.name).is_some() {
            return Err(self.failure(format!(
                "duplicate property `{}` on entity `{}`",
                property.name, self.name
            )));
        }
        self.property_infos.push(property);
        Ok(())
    }

    /// Get a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.property_infos.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyInfo> {
        self.property_infos.iter_mut().find(|p| p.name == name)
    }

    /// Get a navigation by name
    pub fn navigation(&self, name: &str) -> Option<&EntityNavigation> {
        self.navigations.iter().find(|n| n.name == name)
    }

    /// Required, non-collection navigations; their foreign keys become DTO scalars
    pub fn required_navigations(&self) -> impl Iterator<Item = &EntityNavigation> {
        self.navigations
            .iter()
            .filter(|n| n.is_required && !n.is_collection)
    }

    /// Names of all navigations, in declaration order
    pub fn navigation_names(&self) -> Vec<String> {
        self.navigations.iter().map(|n| n.name.clone()).collect()
    }

    /// The key property: an explicit key, else a property named `Id`
    pub fn key_property(&self) -> Option<&PropertyInfo> {
        self.property_infos
            .iter()
            .find(|p| p.is_key)
            .or_else(|| self.property_infos.iter().find(|p| p.name == "Id"))
    }

    /// Check the model invariants
    pub fn validate(&self) -> Result<(), ParseFailure> {
        if self.name.trim().is_empty() {
            return Err(self.failure("entity name is empty".to_string()));
        }
        for (i, prop) in self.property_infos.iter().enumerate() {
            if self.property_infos[..i].iter().any(|p| p.name == prop.name) {
                return Err(self.failure(format!("duplicate property `{}`", prop.name)));
            }
            if prop.is_list && prop.is_dictionary {
                return Err(self.failure(format!(
                    "property `{}` cannot be both a list and a dictionary",
                    prop.name
                )));
            }
            if prop.is_navigation && prop.is_enum {
                return Err(self.failure(format!(
                    "property `{}` cannot be both a navigation and an enum",
                    prop.name
                )));
            }
        }
        Ok(())
    }

    fn failure(&self, reason: String) -> ParseFailure {
        let path = self
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.name.clone());
        ParseFailure::new(path, reason)
    }
}

impl PropertyInfo {
    /// A scalar property of the given canonical type
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_list: false,
            is_dictionary: false,
            is_enum: false,
            is_nullable: false,
            is_required: false,
            is_navigation: false,
            is_complex_type: false,
            is_key: false,
            is_indexed: false,
            max_length: None,
            min_length: None,
            default_value: None,
            comment_summary: None,
            comment_xml: None,
        }
    }

    /// Build a property from a parsed type, deriving the shape flags
    pub fn from_type(name: impl Into<String>, meta: &TypeMeta) -> Self {
        let mut prop = Self::new(name, meta.canonical_name());
        prop.is_list = meta.is_list();
        prop.is_dictionary = meta.is_dictionary();
        prop.is_nullable = meta.is_nullable;
        prop.is_enum = meta.innermost().is_enum;
        prop
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn with_max_length(mut self, max: u32) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Parsed form of `type_name`; unparseable names become an opaque reference
    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta::parse(&self.type_name)
            .unwrap_or_else(|_| TypeMeta::reference(self.type_name.clone()))
    }

    /// Name of the element type for lists, the value type for dictionaries,
    /// the type itself otherwise
    pub fn element_type_name(&self) -> String {
        self.type_meta().innermost().canonical_name()
    }

    pub fn is_bool(&self) -> bool {
        !self.is_list && !self.is_dictionary && self.type_meta().name == "bool"
    }

    pub fn is_string(&self) -> bool {
        !self.is_list && !self.is_dictionary && self.type_meta().name == "string"
    }

    /// Whether this property is worth offering as a filter criterion.
    ///
    /// Required, enum, boolean or indexed scalars qualify; collections,
    /// navigations and text longer than `max_length_threshold` do not.
    pub fn is_filterable(&self, max_length_threshold: u32) -> bool {
        let candidate = self.is_required || self.is_enum || self.is_bool() || self.is_indexed;
        let scalar =
            !self.is_list && !self.is_dictionary && !self.is_navigation && !self.is_complex_type;
        let short_enough = self.max_length.map_or(true, |max| max < max_length_threshold);
        candidate && scalar && short_enough
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_property_rejects_duplicates() {
        let mut entity = EntityInfo::new("Blog", "App.Entities");
        entity.add_property(PropertyInfo::new("Title", "string")).unwrap();
        assert!(entity.add_property(PropertyInfo::new("Title", "int")).is_err());
        // Case-sensitive: a differently cased name is a different property
        assert!(entity.add_property(PropertyInfo::new("title", "int")).is_ok());
        assert!(entity.validate().is_ok());
    }

    #[test]
    fn test_validate_list_and_dictionary_exclusive() {
        let mut entity = EntityInfo::new("Blog", "App.Entities");
        let mut prop = PropertyInfo::new("Tags", "List<string>");
        prop.is_list = true;
        prop.is_dictionary = true;
        entity.property_infos.push(prop);
        assert!(entity.validate().is_err());
    }

    #[test]
    fn test_from_type_flags() {
        let meta = TypeMeta::parse("List<Status>?").unwrap();
        let prop = PropertyInfo::from_type("Statuses", &meta);
        assert!(prop.is_list);
        assert!(prop.is_nullable);
        assert_eq!(prop.type_name, "List<Status>");
        assert_eq!(prop.element_type_name(), "Status");
    }

    #[test]
    fn test_filterability() {
        let name = PropertyInfo::new("Name", "string").required().with_max_length(100);
        assert!(name.is_filterable(1000));

        let content = PropertyInfo::new("Content", "string")
            .required()
            .with_max_length(10_000);
        assert!(!content.is_filterable(1000));

        let flag = PropertyInfo::new("IsPublic", "bool");
        assert!(flag.is_filterable(1000));

        let mut status = PropertyInfo::new("Status", "PostStatus");
        status.is_enum = true;
        assert!(status.is_filterable(1000));

        let age = PropertyInfo::new("Age", "int");
        assert!(!age.is_filterable(1000));

        let mut tags = PropertyInfo::new("Tags", "List<string>").required();
        tags.is_list = true;
        assert!(!tags.is_filterable(1000));
    }

    #[test]
    fn test_key_property_fallback() {
        let mut entity = EntityInfo::new("Blog", "App");
        entity.add_property(PropertyInfo::new("Id", "Guid")).unwrap();
        assert_eq!(entity.key_property().unwrap().name, "Id");
    }
}
