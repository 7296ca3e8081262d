//! Relational adapter: enrich declared entities from an ORM mapping model

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SourceAdapter;
use crate::error::ParseFailure;
use crate::model::{EntityInfo, EntityNavigation};

/// Entity-to-table mappings of one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingModel {
    pub entities: Vec<EntityMapping>,
}

/// One mapped entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnMapping>,
    /// Key properties, in key order
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexMapping>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyMapping>,
}

/// A mapped scalar property and its column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub property: String,
    pub column: String,
    /// Canonical type name
    pub type_name: String,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_generated: bool,
    /// Name of the enum type for enum columns
    #[serde(default)]
    pub enum_type: Option<String>,
    #[serde(default)]
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub name: String,
    pub properties: Vec<String>,
    #[serde(default)]
    pub is_unique: bool,
}

/// A foreign key from the dependent entity to its principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyMapping {
    /// Dependent properties holding the key
    pub properties: Vec<String>,
    /// Principal entity name
    pub principal: String,
    #[serde(default)]
    pub principal_keys: Vec<String>,
    /// Reference navigation on the dependent side
    #[serde(default)]
    pub navigation: Option<String>,
    /// Collection navigation on the principal side
    #[serde(default)]
    pub inverse_navigation: Option<String>,
    #[serde(default)]
    pub is_required: bool,
}

impl MappingModel {
    pub fn entity(&self, name: &str) -> Option<&EntityMapping> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    /// A join entity carrying foreign keys to both `left` and `right`
    pub fn join_entity(&self, left: &str, right: &str) -> Option<&EntityMapping> {
        self.entities
            .iter()
            .filter(|e| e.name != left && e.name != right)
            .find(|e| e.references(left) && e.references(right))
    }
}

impl EntityMapping {
    pub fn column(&self, property: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Whether any foreign key points at `principal`
    pub fn references(&self, principal: &str) -> bool {
        self.foreign_keys.iter().any(|fk| fk.principal == principal)
    }

    /// Whether the key is made of foreign keys only (a pure join table)
    pub fn is_join_table(&self) -> bool {
        self.foreign_keys.len() == 2
            && !self.keys.is_empty()
            && self
                .keys
                .iter()
                .all(|k| self.foreign_keys.iter().any(|fk| fk.properties.contains(k)))
    }

    /// Foreign key backing the reference navigation `navigation` to `principal`
    fn foreign_key_for(&self, navigation: &str, principal: &str) -> Option<&ForeignKeyMapping> {
        if let Some(fk) = self
            .foreign_keys
            .iter()
            .find(|fk| fk.navigation.as_deref() == Some(navigation))
        {
            return Some(fk);
        }
        let candidates: Vec<&ForeignKeyMapping> = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.principal == principal && fk.navigation.is_none())
            .collect();
        let conventional = format!("{}Id", navigation);
        match candidates.as_slice() {
            [only] => Some(*only),
            many => many
                .iter()
                .find(|fk| fk.properties.first() == Some(&conventional))
                .copied(),
        }
    }
}

/// Enriches a declaration-level entity with relationship metadata
pub struct RelationalAdapter<'a> {
    model: &'a MappingModel,
}

impl<'a> RelationalAdapter<'a> {
    pub fn new(model: &'a MappingModel) -> Self {
        Self { model }
    }

    fn reference_navigation(
        &self,
        entity: &EntityInfo,
        mapping: &EntityMapping,
        name: &str,
        target: &str,
    ) -> EntityNavigation {
        let declared = entity.property(name).is_some_and(|p| p.is_required);
        let (foreign_key, fk_required) = match mapping.foreign_key_for(name, target) {
            Some(fk) => (fk.properties.first().cloned(), fk.is_required),
            None => {
                let sibling = format!("{}Id", name);
                let required = entity
                    .property(&sibling)
                    .is_some_and(|p| !p.is_nullable && p.type_meta().is_value_type());
                (entity.property(&sibling).map(|_| sibling), required)
            }
        };
        EntityNavigation {
            name: name.to_string(),
            type_name: target.to_string(),
            foreign_key,
            is_required: declared || fk_required,
            is_collection: false,
            is_skip_navigation: false,
        }
    }

    fn collection_navigation(&self, entity: &EntityInfo, name: &str, target: &str) -> EntityNavigation {
        let dependent = self.model.entity(target);
        let inverse = dependent.and_then(|d| {
            d.foreign_keys
                .iter()
                .filter(|fk| fk.principal == entity.name)
                .find(|fk| fk.inverse_navigation.as_deref().map_or(true, |n| n == name))
        });

        let (foreign_key, is_skip_navigation) = match inverse {
            Some(fk) => (fk.properties.first().cloned(), false),
            None => match self.model.join_entity(&entity.name, target) {
                Some(join) => {
                    debug!("{}.{} is many-to-many through {}", entity.name, name, join.name);
                    (None, true)
                }
                None => (None, false),
            },
        };

        EntityNavigation {
            name: name.to_string(),
            type_name: target.to_string(),
            foreign_key,
            is_required: false,
            is_collection: true,
            is_skip_navigation,
        }
    }
}

impl SourceAdapter for RelationalAdapter<'_> {
    type Input = EntityInfo;

    fn extract(&self, declared: &EntityInfo) -> Result<EntityInfo, ParseFailure> {
        let mapping = self.model.entity(&declared.name).ok_or_else(|| {
            let path = declared
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| declared.name.clone());
            ParseFailure::new(path, format!("entity `{}` is not in the mapping model", declared.name))
        })?;

        let mut entity = declared.clone();
        if entity.comment.is_none() {
            entity.comment = mapping.comment.clone();
        }

        for prop in &mut entity.property_infos {
            let target = prop.element_type_name();
            if !prop.is_dictionary && self.model.contains(&target) {
                prop.is_navigation = true;
                prop.is_complex_type = false;
            }
            if mapping.keys.contains(&prop.name) {
                prop.is_key = true;
            }
            if mapping
                .indexes
                .iter()
                .any(|idx| idx.properties.first() == Some(&prop.name))
            {
                prop.is_indexed = true;
            }
            if let Some(column) = mapping.column(&prop.name) {
                if prop.max_length.is_none() && prop.is_string() {
                    prop.max_length = column.max_length;
                }
            }
        }

        let navigations: Vec<EntityNavigation> = entity
            .property_infos
            .iter()
            .filter(|p| p.is_navigation)
            .map(|p| {
                let target = p.element_type_name();
                if p.is_list {
                    self.collection_navigation(&entity, &p.name, &target)
                } else {
                    self.reference_navigation(&entity, mapping, &p.name, &target)
                }
            })
            .collect();
        entity.navigations = navigations;

        entity.validate()?;
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyInfo;

    fn fk(property: &str, principal: &str, required: bool) -> ForeignKeyMapping {
        ForeignKeyMapping {
            properties: vec![property.to_string()],
            principal: principal.to_string(),
            principal_keys: vec!["Id".into()],
            navigation: None,
            inverse_navigation: None,
            is_required: required,
        }
    }

    fn mapping(name: &str, foreign_keys: Vec<ForeignKeyMapping>) -> EntityMapping {
        EntityMapping {
            name: name.to_string(),
            table: name.to_lowercase(),
            comment: None,
            columns: Vec::new(),
            keys: vec!["Id".into()],
            indexes: Vec::new(),
            foreign_keys,
        }
    }

    fn model() -> MappingModel {
        let mut order = mapping("Order", vec![fk("CustomerId", "Customer", true)]);
        order.columns.push(ColumnMapping {
            property: "Number".into(),
            column: "number".into(),
            type_name: "string".into(),
            is_nullable: false,
            max_length: Some(32),
            default_value: None,
            comment: None,
            is_generated: false,
            enum_type: None,
            enum_values: Vec::new(),
        });
        order.indexes.push(IndexMapping {
            name: "idx_number".into(),
            properties: vec!["Number".into()],
            is_unique: true,
        });

        let mut post_tag = mapping("PostTag", vec![fk("PostId", "Post", true), fk("TagId", "Tag", true)]);
        post_tag.keys = vec!["PostId".into(), "TagId".into()];

        MappingModel {
            entities: vec![
                mapping("Customer", Vec::new()),
                order,
                mapping("Post", Vec::new()),
                mapping("Tag", Vec::new()),
                post_tag,
            ],
        }
    }

    fn list(name: &str, element: &str) -> PropertyInfo {
        let mut prop = PropertyInfo::new(name, format!("List<{}>", element));
        prop.is_list = true;
        prop
    }

    #[test]
    fn test_reference_and_collection_navigations() {
        let model = model();
        let adapter = RelationalAdapter::new(&model);

        let mut order = EntityInfo::new("Order", "Shop");
        order.add_property(PropertyInfo::new("Id", "long")).unwrap();
        order.add_property(PropertyInfo::new("Number", "string")).unwrap();
        order.add_property(PropertyInfo::new("CustomerId", "long")).unwrap();
        let mut customer = PropertyInfo::new("Customer", "Customer");
        customer.is_complex_type = true;
        order.add_property(customer).unwrap();

        let order = adapter.extract(&order).unwrap();
        let number = order.property("Number").unwrap();
        assert_eq!(number.max_length, Some(32));
        assert!(number.is_indexed);
        assert!(order.property("Id").unwrap().is_key);
        let customer = order.property("Customer").unwrap();
        assert!(customer.is_navigation && !customer.is_complex_type);
        let nav = order.navigation("Customer").unwrap();
        assert_eq!(nav.foreign_key.as_deref(), Some("CustomerId"));
        assert!(nav.is_required && !nav.is_collection);

        let mut customer = EntityInfo::new("Customer", "Shop");
        customer.add_property(list("Orders", "Order")).unwrap();
        let customer = adapter.extract(&customer).unwrap();
        let nav = customer.navigation("Orders").unwrap();
        assert!(nav.is_collection && !nav.is_required && !nav.is_skip_navigation);
        assert_eq!(nav.foreign_key.as_deref(), Some("CustomerId"));
    }

    #[test]
    fn test_skip_navigation_through_join_entity() {
        let model = model();
        assert!(model.entity("PostTag").unwrap().is_join_table());

        let mut post = EntityInfo::new("Post", "Blog");
        post.add_property(list("Tags", "Tag")).unwrap();
        let post = RelationalAdapter::new(&model).extract(&post).unwrap();
        let nav = post.navigation("Tags").unwrap();
        assert!(nav.is_skip_navigation);
        assert!(nav.foreign_key.is_none());
    }

    #[test]
    fn test_unmapped_entity_fails() {
        let model = model();
        let entity = EntityInfo::new("Ghost", "Shop");
        let err = RelationalAdapter::new(&model).extract(&entity).unwrap_err();
        assert!(err.reason.contains("Ghost"));
    }
}
