//! Manager generator - C# data-access facades over an EF Core context

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::model::{EntityInfo, GenFileInfo, PropertyInfo};
use crate::projection::{Target, TypeFlags};

use super::dto_generator::{dto_properties, one_line, project_property, DtoKind};
use super::naming::{member_name, parameter_name};
use super::template::TemplateSet;

/// One `dto -> entity` assignment
#[derive(Debug, Clone, Serialize)]
struct AssignData {
    name: String,
    /// Right-hand side of the assignment
    value: String,
    /// The entity has no CLR property; written through the change tracker
    shadow: bool,
}

/// One `Where` clause of the filter query
#[derive(Debug, Clone, Serialize)]
struct FilterData {
    name: String,
    predicate: String,
}

/// A `FindBy{Name}Async` lookup over an indexed property
#[derive(Debug, Clone, Serialize)]
struct LookupData {
    name: String,
    parameter: String,
    type_name: String,
    predicate: String,
}

#[derive(Serialize)]
struct ManagerTemplateData {
    namespace: String,
    imports: Vec<String>,
    entity_name: String,
    manager_name: String,
    summary: String,
    key_type: String,
    key_predicate: String,
    add_dto: String,
    update_dto: String,
    detail_dto: String,
    item_dto: String,
    filter_dto: String,
    add_assignments: Vec<AssignData>,
    update_assignments: Vec<AssignData>,
    detail_fields: Vec<String>,
    item_fields: Vec<String>,
    filters: Vec<FilterData>,
    lookups: Vec<LookupData>,
    includes: Vec<String>,
}

/// Generates one manager class per entity
pub struct ManagerGenerator<'a> {
    config: &'a CodegenConfig,
    templates: &'a TemplateSet,
}

impl<'a> ManagerGenerator<'a> {
    pub fn new(config: &'a CodegenConfig, templates: &'a TemplateSet) -> Self {
        Self { config, templates }
    }

    pub fn generate(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        let naming = &self.config.naming;
        let root = naming.root_namespace_for(entity)?;
        let manager_name = format!("{}Manager", entity.name);
        debug!("Generating manager {}", manager_name);

        let module = entity.module_name.as_deref().filter(|m| !m.is_empty());
        let namespace = join_namespace(&[&root, &naming.manager_namespace, module.unwrap_or("")]);
        let dto_namespace = join_namespace(&[
            &root,
            &naming.dto_namespace,
            module.unwrap_or(""),
            &format!("{}Dtos", entity.name),
        ]);

        let (key_type, key_predicate) = self.key(entity);

        let data = ManagerTemplateData {
            namespace,
            imports: usings(&[
                "System",
                "System.Collections.Generic",
                "System.Linq",
                "System.Threading.Tasks",
                "Microsoft.EntityFrameworkCore",
                &entity.namespace_name,
                &dto_namespace,
            ]),
            entity_name: entity.name.clone(),
            manager_name: manager_name.clone(),
            summary: one_line(entity.comment.as_deref()),
            key_type,
            key_predicate,
            add_dto: DtoKind::Add.type_name(&entity.name),
            update_dto: DtoKind::Update.type_name(&entity.name),
            detail_dto: DtoKind::Detail.type_name(&entity.name),
            item_dto: DtoKind::Item.type_name(&entity.name),
            filter_dto: DtoKind::Filter.type_name(&entity.name),
            add_assignments: self.assignments(entity, DtoKind::Add),
            update_assignments: self.assignments(entity, DtoKind::Update),
            detail_fields: self.field_names(entity, DtoKind::Detail),
            item_fields: self.field_names(entity, DtoKind::Item),
            filters: self.filters(entity),
            lookups: self.lookups(entity),
            includes: entity
                .navigation_names()
                .iter()
                .map(|n| member_name(Target::CSharp, n))
                .collect(),
        };

        let content = self.templates.render("manager.cs.j2", &data)?;
        let mut dir = naming.manager_dir.clone();
        if let Some(module) = module {
            dir.push(module);
        }
        let file_name = format!("{}.cs", manager_name);
        Ok(vec![GenFileInfo::new(
            file_name.clone(),
            dir.join(file_name),
            content,
        )])
    }

    /// C# key type and the predicate selecting one row by key
    fn key(&self, entity: &EntityInfo) -> (String, String) {
        match entity.key_property() {
            Some(key) => (
                key_type_name(key),
                format!("q.{} == id", member_name(Target::CSharp, &key.name)),
            ),
            None => {
                let key_type = Target::CSharp
                    .formatter()
                    .format(&self.config.naming.key_type, TypeFlags::default());
                let predicate = format!("EF.Property<{}>(q, \"Id\") == id", key_type);
                (key_type, predicate)
            }
        }
    }

    fn assignments(&self, entity: &EntityInfo, kind: DtoKind) -> Vec<AssignData> {
        dto_properties(entity, kind, self.config)
            .iter()
            .map(|prop| {
                let name = member_name(Target::CSharp, &prop.name);
                let unwrap = kind == DtoKind::Update && is_value_type(prop);
                AssignData {
                    value: if unwrap {
                        format!("dto.{}.Value", name)
                    } else {
                        format!("dto.{}", name)
                    },
                    shadow: entity.property(&prop.name).is_none(),
                    name,
                }
            })
            .collect()
    }

    fn field_names(&self, entity: &EntityInfo, kind: DtoKind) -> Vec<String> {
        dto_properties(entity, kind, self.config)
            .iter()
            .map(|p| member_name(Target::CSharp, &p.name))
            .collect()
    }

    fn filters(&self, entity: &EntityInfo) -> Vec<FilterData> {
        dto_properties(entity, DtoKind::Filter, self.config)
            .iter()
            .map(|prop| {
                let name = member_name(Target::CSharp, &prop.name);
                let predicate = if entity.property(&prop.name).is_none() {
                    let mut scalar = prop.clone();
                    scalar.is_nullable = false;
                    format!(
                        "EF.Property<{}>(q, \"{}\") == filter.{}",
                        project_property(Target::CSharp, &scalar),
                        prop.name,
                        name
                    )
                } else if prop.is_string() {
                    format!("q.{0}.Contains(filter.{0})", name)
                } else {
                    format!("q.{0} == filter.{0}", name)
                };
                FilterData { name, predicate }
            })
            .collect()
    }

    fn lookups(&self, entity: &EntityInfo) -> Vec<LookupData> {
        entity
            .property_infos
            .iter()
            .filter(|p| p.is_indexed && !p.is_key && !p.is_list && !p.is_dictionary)
            .filter(|p| !p.is_navigation && !p.is_complex_type)
            .map(|prop| {
                let name = member_name(Target::CSharp, &prop.name);
                let parameter = parameter_name(Target::CSharp, &prop.name);
                let mut scalar = prop.clone();
                scalar.is_nullable = false;
                LookupData {
                    predicate: format!("q.{} == {}", name, parameter),
                    type_name: project_property(Target::CSharp, &scalar),
                    name,
                    parameter,
                }
            })
            .collect()
    }
}

fn key_type_name(key: &PropertyInfo) -> String {
    let mut scalar = key.clone();
    scalar.is_nullable = false;
    project_property(Target::CSharp, &scalar)
}

/// Whether a nullable C# rendering of this property is a `Nullable<T>`
fn is_value_type(prop: &PropertyInfo) -> bool {
    !prop.is_list && !prop.is_dictionary && (prop.is_enum || prop.type_meta().is_value_type())
}

/// Join namespace segments, skipping empty ones
pub(crate) fn join_namespace(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Sorted, deduplicated `using` lines
pub(crate) fn usings(namespaces: &[&str]) -> Vec<String> {
    namespaces
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|n| format!("using {};", n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::model::EntityNavigation;

    fn blog() -> EntityInfo {
        let mut entity = EntityInfo::new("Blog", "Shop.Entities");
        entity.module_name = Some("Content".into());
        let mut id = PropertyInfo::new("Id", "Guid");
        id.is_key = true;
        entity.add_property(id).unwrap();
        entity
            .add_property(PropertyInfo::new("Title", "string").required().with_max_length(100))
            .unwrap();
        entity.add_property(PropertyInfo::new("Views", "int")).unwrap();
        let mut slug = PropertyInfo::new("Slug", "string");
        slug.is_indexed = true;
        entity.add_property(slug).unwrap();
        let mut author = PropertyInfo::new("Author", "User");
        author.is_navigation = true;
        entity.add_property(author).unwrap();
        entity.navigations.push(EntityNavigation {
            name: "Author".into(),
            type_name: "User".into(),
            foreign_key: Some("AuthorId".into()),
            is_required: true,
            is_collection: false,
            is_skip_navigation: false,
        });
        entity
    }

    fn config() -> CodegenConfig {
        CodegenConfig {
            naming: NamingConfig {
                root_namespace: Some("Shop".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_manager() {
        let config = config();
        let templates = TemplateSet::builtin().unwrap();
        let files = ManagerGenerator::new(&config, &templates)
            .generate(&blog())
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].full_name(),
            std::path::Path::new("Application/Managers/Content/BlogManager.cs")
        );

        let content = files[0].content();
        assert!(content.contains("namespace Shop.Application.Managers.Content;"));
        assert!(content.contains("using Shop.Share.Models.Content.BlogDtos;"));
        assert!(content.contains("public partial class BlogManager"));
        assert!(content.contains("Task<Blog> AddAsync(BlogAddDto dto)"));
        assert!(content.contains("Title = dto.Title,"));
        // AuthorId is not a CLR property of Blog
        assert!(content.contains("Property(\"AuthorId\").CurrentValue = dto.AuthorId;"));
        assert!(content.contains("entity.Views = dto.Views.Value;"));
        assert!(content.contains("query = query.Where(q => q.Title.Contains(filter.Title));"));
        assert!(content.contains(".Include(q => q.Author)"));
        assert!(content.contains("FindBySlugAsync(string slug)"));
        assert!(content.contains("q.Id == id"));
    }

    #[test]
    fn test_usings_sorted_and_deduplicated() {
        let lines = usings(&["System.Linq", "System", "", "System.Linq"]);
        assert_eq!(lines, vec!["using System;", "using System.Linq;"]);
    }

    #[test]
    fn test_join_namespace() {
        assert_eq!(join_namespace(&["Shop", "", "Managers"]), "Shop.Managers");
    }
}
