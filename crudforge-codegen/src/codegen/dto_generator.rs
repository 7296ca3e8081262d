//! DTO generator - Add/Update/Detail/Item/Filter transfer objects per entity

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::model::{EntityInfo, GenFileInfo, PropertyInfo};
use crate::projection::{describe, Target, TypeFlags};

use super::naming::{dir_name, file_stem, member_name};
use super::template::TemplateSet;
use super::format_rust;

/// The DTO shapes generated for every entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DtoKind {
    Add,
    Update,
    Detail,
    Item,
    Filter,
}

impl DtoKind {
    pub const ALL: [DtoKind; 5] = [
        DtoKind::Add,
        DtoKind::Update,
        DtoKind::Detail,
        DtoKind::Item,
        DtoKind::Filter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DtoKind::Add => "Add",
            DtoKind::Update => "Update",
            DtoKind::Detail => "Detail",
            DtoKind::Item => "Item",
            DtoKind::Filter => "Filter",
        }
    }

    /// Type name of this DTO for an entity, e.g. `BlogAddDto`
    pub fn type_name(self, entity_name: &str) -> String {
        format!("{}{}Dto", entity_name, self.label())
    }
}

/// Foreign-key scalars contributed by required reference navigations.
///
/// An existing scalar property with the foreign key's name is reused; when
/// the entity has none, one is synthesized with `key_type`.
pub fn required_foreign_keys(entity: &EntityInfo, key_type: &str) -> Vec<PropertyInfo> {
    entity
        .required_navigations()
        .map(|nav| {
            let fk = nav
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}Id", nav.name));
            match entity.property(&fk) {
                Some(existing) if !existing.is_navigation => {
                    let mut prop = existing.clone();
                    prop.is_required = true;
                    prop.is_nullable = false;
                    prop
                }
                _ => PropertyInfo::new(fk, key_type).required(),
            }
        })
        .collect()
}

/// Properties that make up one DTO of `entity`
pub fn dto_properties(
    entity: &EntityInfo,
    kind: DtoKind,
    config: &CodegenConfig,
) -> Vec<PropertyInfo> {
    let threshold = config.filter_max_length;
    let mut props: Vec<PropertyInfo> = match kind {
        DtoKind::Add | DtoKind::Update => entity
            .property_infos
            .iter()
            .filter(|p| !config.is_ignored(&p.name) && !p.is_navigation && !p.is_complex_type)
            .cloned()
            .collect(),
        DtoKind::Detail => entity
            .property_infos
            .iter()
            .filter(|p| !p.is_navigation)
            .cloned()
            .collect(),
        DtoKind::Item => entity
            .property_infos
            .iter()
            .filter(|p| !p.is_navigation && !p.is_list && !p.is_dictionary)
            .filter(|p| !(p.is_string() && p.max_length.is_some_and(|max| max >= threshold)))
            .cloned()
            .collect(),
        DtoKind::Filter => entity
            .property_infos
            .iter()
            .filter(|p| !config.is_ignored(&p.name) && p.is_filterable(threshold))
            .cloned()
            .collect(),
    };

    if matches!(kind, DtoKind::Add | DtoKind::Update | DtoKind::Filter) {
        for fk in required_foreign_keys(entity, &config.naming.key_type) {
            if config.is_ignored(&fk.name) {
                continue;
            }
            match props.iter_mut().find(|p| p.name == fk.name) {
                Some(existing) => existing.is_required = true,
                None => props.push(fk),
            }
        }
    }

    if matches!(kind, DtoKind::Update | DtoKind::Filter) {
        for prop in &mut props {
            prop.is_nullable = true;
            prop.is_required = false;
        }
    }
    props
}

/// Project a property's canonical type into a target language
pub fn project_property(target: Target, prop: &PropertyInfo) -> String {
    target.formatter().format(&prop.type_name, property_flags(prop))
}

pub(crate) fn property_flags(prop: &PropertyInfo) -> TypeFlags {
    TypeFlags {
        is_enum: prop.is_enum,
        is_list: prop.is_list,
        is_nullable: prop.is_nullable,
    }
}

/// Named types a set of properties refers to, sorted
pub(crate) fn referenced_types(props: &[PropertyInfo]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for prop in props {
        describe(&prop.type_name, property_flags(prop)).collect_references(&mut out);
    }
    out
}

/// Collapse a comment to one line for `///` and `/** */` positions
pub(crate) fn one_line(comment: Option<&str>) -> String {
    comment
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// A property as seen by a template
#[derive(Debug, Clone, Serialize)]
pub struct FieldData {
    /// Member name in the target language
    pub name: String,
    /// Canonical property name
    pub source_name: String,
    /// Projected type
    pub type_name: String,
    pub comment: String,
    pub default_value: String,
    pub is_required: bool,
    pub is_nullable: bool,
    pub is_string: bool,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
    /// C# property initializer including the leading ` = `, or empty
    pub initializer: String,
}

impl FieldData {
    pub fn new(target: Target, prop: &PropertyInfo) -> Self {
        Self {
            name: member_name(target, &prop.name),
            source_name: prop.name.clone(),
            type_name: project_property(target, prop),
            comment: one_line(prop.comment_summary.as_deref()),
            default_value: prop.default_value.clone().unwrap_or_default(),
            is_required: prop.is_required,
            is_nullable: prop.is_nullable,
            is_string: prop.is_string(),
            max_length: prop.max_length,
            min_length: prop.min_length,
            initializer: csharp_initializer(target, prop),
        }
    }
}

/// Non-nullable C# reference types need an initial value
fn csharp_initializer(target: Target, prop: &PropertyInfo) -> String {
    if target != Target::CSharp || prop.is_nullable {
        return String::new();
    }
    if prop.is_list || prop.is_dictionary {
        return " = new();".to_string();
    }
    let meta = prop.type_meta();
    if prop.is_enum || meta.is_value_type() {
        String::new()
    } else if prop.is_string() {
        " = string.Empty;".to_string()
    } else {
        " = default!;".to_string()
    }
}

#[derive(Serialize)]
struct DtoTemplateData {
    namespace: String,
    imports: Vec<String>,
    type_name: String,
    entity_name: String,
    kind: &'static str,
    summary: String,
    base_class: String,
    fields: Vec<FieldData>,
    paging: bool,
}

#[derive(Serialize)]
struct ModTemplateData {
    modules: Vec<String>,
}

/// Generates the DTO files of one entity
pub struct DtoGenerator<'a> {
    config: &'a CodegenConfig,
    templates: &'a TemplateSet,
    target: Target,
}

impl<'a> DtoGenerator<'a> {
    pub fn new(config: &'a CodegenConfig, templates: &'a TemplateSet) -> Self {
        Self {
            config,
            templates,
            target: config.dto_target,
        }
    }

    /// Render into a different language than the configured one
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Generate every DTO kind for an entity
    pub fn generate(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        let root = self.config.naming.root_namespace_for(entity)?;
        let dir = self.entity_dir(entity);

        let mut files = Vec::new();
        for kind in DtoKind::ALL {
            files.push(self.generate_kind(entity, kind, &root, &dir)?);
        }

        if self.target == Target::Rust {
            let modules = DtoKind::ALL
                .iter()
                .map(|kind| file_stem(Target::Rust, &kind.type_name(&entity.name)))
                .collect();
            let content = self
                .templates
                .render("dto_mod.rs.j2", ModTemplateData { modules })?;
            files.push(GenFileInfo::new("mod.rs", dir.join("mod.rs"), content));
        }
        Ok(files)
    }

    fn generate_kind(
        &self,
        entity: &EntityInfo,
        kind: DtoKind,
        root: &str,
        dir: &std::path::Path,
    ) -> Result<GenFileInfo> {
        let type_name = kind.type_name(&entity.name);
        let props = dto_properties(entity, kind, self.config);
        debug!(
            "Generating {} with {} properties ({})",
            type_name,
            props.len(),
            self.target
        );

        let data = DtoTemplateData {
            namespace: self.namespace(entity, root),
            imports: self.imports(entity, &props),
            type_name: type_name.clone(),
            entity_name: entity.name.clone(),
            kind: kind.label(),
            summary: one_line(entity.comment.as_deref()),
            base_class: if kind == DtoKind::Filter && self.target == Target::CSharp {
                format!(" : {}", self.config.naming.filter_base_class)
            } else {
                String::new()
            },
            fields: props.iter().map(|p| FieldData::new(self.target, p)).collect(),
            paging: kind == DtoKind::Filter && self.target != Target::CSharp,
        };

        let template = format!("dto.{}.j2", self.target.extension());
        let mut content = self.templates.render(&template, &data)?;
        if self.target == Target::Rust {
            content = format_rust(content);
        }

        let file_name = format!(
            "{}.{}",
            file_stem(self.target, &type_name),
            self.target.extension()
        );
        let path = dir.join(&file_name);
        Ok(GenFileInfo::new(file_name, path, content))
    }

    /// `{dto_dir}/{module}/{Entity}Dtos` in the target's naming style
    fn entity_dir(&self, entity: &EntityInfo) -> PathBuf {
        let mut dir = self.config.naming.dto_dir.clone();
        if let Some(module) = entity.module_name.as_deref().filter(|m| !m.is_empty()) {
            dir.push(dir_name(self.target, module));
        }
        dir.push(dir_name(self.target, &format!("{}Dtos", entity.name)));
        dir
    }

    /// `{root}.{dto_namespace}.{module}.{Entity}Dtos`
    fn namespace(&self, entity: &EntityInfo, root: &str) -> String {
        let mut parts = vec![root.to_string(), self.config.naming.dto_namespace.clone()];
        if let Some(module) = entity.module_name.as_deref().filter(|m| !m.is_empty()) {
            parts.push(module.to_string());
        }
        parts.push(format!("{}Dtos", entity.name));
        parts.retain(|p| !p.is_empty());
        parts.join(".")
    }

    fn imports(&self, entity: &EntityInfo, props: &[PropertyInfo]) -> Vec<String> {
        let references = referenced_types(props);
        match self.target {
            Target::CSharp => {
                let mut usings = BTreeSet::new();
                usings.insert("System".to_string());
                if props.iter().any(|p| p.is_list || p.is_dictionary) {
                    usings.insert("System.Collections.Generic".to_string());
                }
                if props
                    .iter()
                    .any(|p| p.is_required || p.max_length.is_some() || p.min_length.is_some())
                {
                    usings.insert("System.ComponentModel.DataAnnotations".to_string());
                }
                if !references.is_empty() && !entity.namespace_name.is_empty() {
                    usings.insert(entity.namespace_name.clone());
                }
                usings
                    .into_iter()
                    .map(|u| format!("using {};", u))
                    .collect()
            }
            Target::TypeScript if !references.is_empty() => {
                let names: Vec<String> = references.into_iter().collect();
                vec![format!(
                    "import {{ {} }} from '{}';",
                    names.join(", "),
                    self.config.naming.ts_types_import
                )]
            }
            Target::Rust if !references.is_empty() => {
                let names: Vec<String> = references.into_iter().collect();
                vec![format!(
                    "use {}::{{{}}};",
                    self.config.naming.rust_types_path,
                    names.join(", ")
                )]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::model::EntityNavigation;

    fn config(target: Target) -> CodegenConfig {
        CodegenConfig {
            dto_target: target,
            naming: NamingConfig {
                root_namespace: Some("Shop".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn test_entity() -> EntityInfo {
        let mut entity = EntityInfo::new("TestEntity", "Shop.Entities");
        entity
            .add_property(PropertyInfo::new("Name", "string").required())
            .unwrap();
        entity.add_property(PropertyInfo::new("Age", "int")).unwrap();
        entity.add_property(PropertyInfo::new("Id", "Guid")).unwrap();
        entity
            .add_property(PropertyInfo::new("CreatedTime", "DateTime"))
            .unwrap();
        entity
    }

    fn order_entity() -> EntityInfo {
        let mut entity = EntityInfo::new("Order", "Shop.Entities");
        entity.add_property(PropertyInfo::new("Id", "Guid")).unwrap();
        entity
            .add_property(PropertyInfo::new("Code", "string").required().with_max_length(20))
            .unwrap();
        let mut customer = PropertyInfo::new("Customer", "Customer");
        customer.is_navigation = true;
        entity.add_property(customer).unwrap();
        let mut items = PropertyInfo::new("Items", "List<OrderItem>");
        items.is_list = true;
        items.is_navigation = true;
        entity.add_property(items).unwrap();
        entity.navigations.push(EntityNavigation {
            name: "Customer".into(),
            type_name: "Customer".into(),
            foreign_key: Some("CustomerId".into()),
            is_required: true,
            is_collection: false,
            is_skip_navigation: false,
        });
        entity.navigations.push(EntityNavigation {
            name: "Items".into(),
            type_name: "OrderItem".into(),
            foreign_key: Some("OrderId".into()),
            is_required: true,
            is_collection: true,
            is_skip_navigation: false,
        });
        entity
    }

    fn names(props: &[PropertyInfo]) -> Vec<&str> {
        props.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_add_and_update_properties() {
        let config = config(Target::CSharp);
        let entity = test_entity();

        let add = dto_properties(&entity, DtoKind::Add, &config);
        assert_eq!(names(&add), vec!["Name", "Age"]);
        assert!(add[0].is_required);

        let update = dto_properties(&entity, DtoKind::Update, &config);
        assert_eq!(names(&update), vec!["Name", "Age"]);
        assert!(update.iter().all(|p| p.is_nullable && !p.is_required));
        assert_eq!(project_property(Target::CSharp, &update[0]), "string?");
        assert_eq!(project_property(Target::CSharp, &update[1]), "int?");
    }

    #[test]
    fn test_detail_keeps_ignored_properties() {
        let config = config(Target::CSharp);
        let detail = dto_properties(&test_entity(), DtoKind::Detail, &config);
        assert_eq!(names(&detail), vec!["Name", "Age", "Id", "CreatedTime"]);
    }

    #[test]
    fn test_required_navigation_foreign_keys() {
        let config = config(Target::CSharp);
        let entity = order_entity();

        let fks = required_foreign_keys(&entity, "Guid");
        assert_eq!(names(&fks), vec!["CustomerId"]);
        assert!(fks[0].is_required);
        assert_eq!(fks[0].type_name, "Guid");

        let add = dto_properties(&entity, DtoKind::Add, &config);
        assert_eq!(names(&add), vec!["Code", "CustomerId"]);

        let filter = dto_properties(&entity, DtoKind::Filter, &config);
        assert_eq!(names(&filter), vec!["Code", "CustomerId"]);
        assert!(filter.iter().all(|p| p.is_nullable));
    }

    #[test]
    fn test_item_drops_collections_and_long_text() {
        let config = config(Target::CSharp);
        let mut entity = test_entity();
        entity
            .add_property(PropertyInfo::new("Content", "string").with_max_length(5000))
            .unwrap();
        let mut tags = PropertyInfo::new("Tags", "List<string>");
        tags.is_list = true;
        entity.add_property(tags).unwrap();

        let item = dto_properties(&entity, DtoKind::Item, &config);
        assert_eq!(names(&item), vec!["Name", "Age", "Id", "CreatedTime"]);
    }

    #[test]
    fn test_generate_csharp() {
        let config = config(Target::CSharp);
        let templates = TemplateSet::builtin().unwrap();
        let files = DtoGenerator::new(&config, &templates)
            .generate(&order_entity())
            .unwrap();
        assert_eq!(files.len(), 5);

        let add = &files[0];
        assert_eq!(add.name(), "OrderAddDto.cs");
        assert_eq!(
            add.full_name(),
            std::path::Path::new("Share/Models/OrderDtos/OrderAddDto.cs")
        );
        let content = add.content();
        assert!(content.contains("namespace Shop.Share.Models.OrderDtos;"));
        assert!(content.contains("public class OrderAddDto"));
        assert!(content.contains("[MaxLength(20)]"));
        assert!(content.contains("public string Code { get; set; } = string.Empty;"));
        assert!(content.contains("public Guid CustomerId { get; set; }"));
        assert!(!content.contains("Items"));

        let filter = &files[4];
        assert!(filter.content().contains("public class OrderFilterDto : FilterBase"));
        assert!(filter.content().contains("public Guid? CustomerId { get; set; }"));
    }

    #[test]
    fn test_generate_typescript() {
        let config = config(Target::TypeScript);
        let templates = TemplateSet::builtin().unwrap();
        let mut entity = order_entity();
        let mut status = PropertyInfo::new("Status", "OrderStatus").required();
        status.is_enum = true;
        entity.add_property(status).unwrap();

        let files = DtoGenerator::new(&config, &templates).generate(&entity).unwrap();
        let add = &files[0];
        assert_eq!(
            add.full_name(),
            std::path::Path::new("Share/Models/order-dtos/order-add-dto.ts")
        );
        let content = add.content();
        assert!(content.contains("import { OrderStatus } from '../models';"));
        assert!(content.contains("export interface OrderAddDto {"));
        assert!(content.contains("  code: string;"));
        assert!(content.contains("  status: OrderStatus;"));

        let filter = files[4].content();
        assert!(filter.contains("  code?: string | null;"));
        assert!(filter.contains("  pageIndex?: number;"));
    }

    #[test]
    fn test_generate_rust() {
        let config = config(Target::Rust);
        let templates = TemplateSet::builtin().unwrap();
        let files = DtoGenerator::new(&config, &templates)
            .generate(&test_entity())
            .unwrap();
        assert_eq!(files.len(), 6);
        assert_eq!(
            files[0].full_name(),
            std::path::Path::new("Share/Models/test_entity_dtos/test_entity_add_dto.rs")
        );
        let add = files[0].content();
        assert!(add.contains("pub struct TestEntityAddDto {"));
        assert!(add.contains("pub name: String,"));
        assert!(add.contains("pub age: i32,"));

        let update = files[1].content();
        assert!(update.contains("pub age: Option<i32>,"));

        let module = files[5].content();
        assert!(module.contains("mod test_entity_add_dto;"));
        assert!(module.contains("pub use test_entity_filter_dto::*;"));
    }

    #[test]
    fn test_missing_namespace_is_config_error() {
        let config = CodegenConfig::default();
        let templates = TemplateSet::builtin().unwrap();
        let entity = EntityInfo::new("Orphan", "");
        assert!(DtoGenerator::new(&config, &templates).generate(&entity).is_err());
    }
}
