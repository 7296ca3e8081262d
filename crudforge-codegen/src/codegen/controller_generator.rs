//! Controller generator - ASP.NET Core controllers per entity and per document tag

use heck::{ToLowerCamelCase, ToPascalCase};
use serde::Serialize;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::model::{ApiDocument, EntityInfo, GenFileInfo, OperationInfo, ParameterLocation};
use crate::projection::{Target, TypeFormatter};

use super::dto_generator::{dto_properties, one_line, project_property, DtoKind};
use super::manager_generator::{join_namespace, usings};
use super::naming::{member_name, operation_method_name, parameter_name, to_type_name};
use super::template::TemplateSet;

/// A required navigation that must exist before an entity is added
#[derive(Debug, Clone, Serialize)]
struct NavigationCheck {
    /// Foreign key member on the Add DTO
    field: String,
    entity_name: String,
    manager_field: String,
}

/// An injected manager
#[derive(Debug, Clone, Serialize, PartialEq)]
struct ManagerDependency {
    type_name: String,
    field: String,
    parameter: String,
}

#[derive(Serialize)]
struct ControllerTemplateData {
    namespace: String,
    imports: Vec<String>,
    entity_name: String,
    controller_name: String,
    summary: String,
    manager_name: String,
    key_type: String,
    add_dto: String,
    update_dto: String,
    filter_dto: String,
    constructor_parameters: String,
    dependencies: Vec<ManagerDependency>,
    checks: Vec<NavigationCheck>,
}

#[derive(Debug, Clone, Serialize)]
struct ActionData {
    name: String,
    summary: String,
    http_attribute: String,
    path: String,
    return_type: String,
    parameters: String,
}

#[derive(Serialize)]
struct ApiControllerTemplateData {
    namespace: String,
    imports: Vec<String>,
    controller_name: String,
    tag: String,
    actions: Vec<ActionData>,
}

/// Generates C# controllers
pub struct ControllerGenerator<'a> {
    config: &'a CodegenConfig,
    templates: &'a TemplateSet,
}

impl<'a> ControllerGenerator<'a> {
    pub fn new(config: &'a CodegenConfig, templates: &'a TemplateSet) -> Self {
        Self { config, templates }
    }

    /// REST controller over an entity's manager
    pub fn generate(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        let naming = &self.config.naming;
        let root = naming.root_namespace_for(entity)?;
        let module = entity.module_name.as_deref().unwrap_or("");
        let controller_name = format!("{}Controller", entity.name);
        let manager_name = format!("{}Manager", entity.name);
        debug!("Generating controller {}", controller_name);

        let manager_namespace = join_namespace(&[&root, &naming.manager_namespace, module]);
        let dto_namespace = join_namespace(&[
            &root,
            &naming.dto_namespace,
            module,
            &format!("{}Dtos", entity.name),
        ]);

        let add_fields: Vec<String> = dto_properties(entity, DtoKind::Add, self.config)
            .iter()
            .map(|p| p.name.clone())
            .collect();

        let mut dependencies = vec![ManagerDependency {
            type_name: manager_name.clone(),
            field: "_manager".to_string(),
            parameter: "manager".to_string(),
        }];
        let mut checks = Vec::new();
        for nav in entity.required_navigations() {
            let fk = nav
                .foreign_key
                .clone()
                .unwrap_or_else(|| format!("{}Id", nav.name));
            if !add_fields.contains(&fk) {
                continue;
            }
            let manager_field = if nav.type_name == entity.name {
                "_manager".to_string()
            } else {
                let camel = nav.type_name.to_lower_camel_case();
                let dependency = ManagerDependency {
                    type_name: format!("{}Manager", nav.type_name),
                    field: format!("_{}Manager", camel),
                    parameter: format!("{}Manager", camel),
                };
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency.clone());
                }
                dependency.field
            };
            checks.push(NavigationCheck {
                field: member_name(Target::CSharp, &fk),
                entity_name: nav.type_name.clone(),
                manager_field,
            });
        }

        let key_type = match entity.key_property() {
            Some(key) => {
                let mut key = key.clone();
                key.is_nullable = false;
                project_property(Target::CSharp, &key)
            }
            None => Target::CSharp
                .formatter()
                .format(&naming.key_type, Default::default()),
        };

        let data = ControllerTemplateData {
            namespace: join_namespace(&[&root, &naming.controller_namespace, module]),
            imports: usings(&[
                "System",
                "System.Threading.Tasks",
                "Microsoft.AspNetCore.Mvc",
                &manager_namespace,
                &dto_namespace,
            ]),
            entity_name: entity.name.clone(),
            controller_name: controller_name.clone(),
            summary: one_line(entity.comment.as_deref()),
            manager_name,
            key_type,
            add_dto: DtoKind::Add.type_name(&entity.name),
            update_dto: DtoKind::Update.type_name(&entity.name),
            filter_dto: DtoKind::Filter.type_name(&entity.name),
            constructor_parameters: dependencies
                .iter()
                .map(|d| format!("{} {}", d.type_name, d.parameter))
                .collect::<Vec<_>>()
                .join(", "),
            dependencies,
            checks,
        };

        let content = self.templates.render("controller.cs.j2", &data)?;
        let mut dir = naming.controller_dir.clone();
        if !module.is_empty() {
            dir.push(module);
        }
        let file_name = format!("{}.cs", controller_name);
        Ok(vec![GenFileInfo::new(
            file_name.clone(),
            dir.join(file_name),
            content,
        )])
    }

    /// One controller per tag with an action stub per operation
    pub fn generate_document(&self, document: &ApiDocument) -> Result<Vec<GenFileInfo>> {
        let naming = &self.config.naming;
        let root = naming.root_namespace_or(&to_type_name(&document.title))?;
        let formatter = Target::CSharp.formatter();

        let mut files = Vec::new();
        for tag in document.tags() {
            let controller_name = format!("{}Controller", to_type_name(&tag));
            let actions: Vec<ActionData> = document
                .operations_for(&tag)
                .map(|op| action(op, formatter))
                .collect();
            debug!(
                "Generating {} with {} actions",
                controller_name,
                actions.len()
            );

            let data = ApiControllerTemplateData {
                namespace: join_namespace(&[&root, &naming.controller_namespace]),
                imports: usings(&[
                    "System",
                    "System.Collections.Generic",
                    "System.Threading.Tasks",
                    "Microsoft.AspNetCore.Http",
                    "Microsoft.AspNetCore.Mvc",
                    &join_namespace(&[&root, &naming.dto_namespace]),
                ]),
                controller_name: controller_name.clone(),
                tag: tag.clone(),
                actions,
            };
            let content = self.templates.render("api_controller.cs.j2", &data)?;
            let file_name = format!("{}.cs", controller_name);
            files.push(GenFileInfo::new(
                file_name.clone(),
                naming.controller_dir.join(file_name),
                content,
            ));
        }
        Ok(files)
    }
}

fn action(op: &OperationInfo, formatter: &dyn TypeFormatter) -> ActionData {
    let mut parameters = Vec::new();
    for (location, attribute) in [
        (ParameterLocation::Path, "FromRoute"),
        (ParameterLocation::Query, "FromQuery"),
        (ParameterLocation::Header, "FromHeader"),
    ] {
        for param in op.parameters_in(location) {
            let meta = param
                .type_meta
                .clone()
                .with_nullable(param.type_meta.is_nullable || !param.is_required);
            parameters.push(format!(
                "[{}(Name = \"{}\")] {} {}",
                attribute,
                param.name,
                formatter.format_meta(&meta),
                parameter_name(Target::CSharp, &param.name)
            ));
        }
    }
    if let Some(body) = &op.request_body {
        if body.is_multipart() {
            parameters.push("[FromForm] IFormCollection form".to_string());
        } else {
            parameters.push(format!("[FromBody] {} body", formatter.format_meta(&body.type_meta)));
        }
    }

    let return_type = match &op.response {
        Some(meta) => format!("ActionResult<{}>", formatter.format_meta(meta)),
        None => "IActionResult".to_string(),
    };

    ActionData {
        name: operation_method_name(op.operation_id.as_deref(), &op.method, &op.path)
            .to_pascal_case(),
        summary: one_line(op.summary.as_deref()),
        http_attribute: format!("Http{}", op.method.to_lowercase().to_pascal_case()),
        path: op.path.clone(),
        return_type,
        parameters: parameters.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingConfig;
    use crate::model::{
        EntityNavigation, ParameterInfo, PropertyInfo, RequestBody, TypeMeta,
    };

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
    fn test_entity_controller_checks_required_navigations() {
        let mut entity = EntityInfo::new("Order", "Shop.Entities");
        entity.add_property(PropertyInfo::new("Id", "long")).unwrap();
        entity
            .add_property(PropertyInfo::new("CustomerId", "long").required())
            .unwrap();
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
            is_required: false,
            is_collection: true,
            is_skip_navigation: false,
        });

        let config = config();
        let templates = TemplateSet::builtin().unwrap();
        let files = ControllerGenerator::new(&config, &templates)
            .generate(&entity)
            .unwrap();
        let content = files[0].content();
        assert_eq!(
            files[0].full_name(),
            std::path::Path::new("Http.API/Controllers/OrderController.cs")
        );
        assert!(content.contains("public class OrderController : ControllerBase"));
        assert!(content.contains("private readonly CustomerManager _customerManager;"));
        assert!(content.contains("if (!await _customerManager.ExistsAsync(dto.CustomerId))"));
        assert!(content.contains("[HttpGet(\"{id}\")]"));
        assert!(content.contains("GetDetailAsync([FromRoute] long id)"));
        assert!(content.contains("OrderController(OrderManager manager, CustomerManager customerManager)"));
        assert!(!content.contains("OrderItemManager"));
    }

    #[test]
    fn test_document_controllers_per_tag() {
        let mut document = ApiDocument {
            title: "Pet Store".into(),
            version: "1.0".into(),
            ..Default::default()
        };
        document.operations.push(OperationInfo {
            operation_id: Some("getPet".into()),
            method: "GET".into(),
            path: "/pets/{petId}".into(),
            tag: "pets".into(),
            summary: Some("Find a pet".into()),
            parameters: vec![ParameterInfo {
                name: "petId".into(),
                location: ParameterLocation::Path,
                type_meta: TypeMeta::primitive("long"),
                is_required: true,
                comment: None,
            }],
            request_body: None,
            response: Some(TypeMeta::reference("Pet")),
        });
        document.operations.push(OperationInfo {
            operation_id: None,
            method: "POST".into(),
            path: "/store/orders".into(),
            tag: "store".into(),
            summary: None,
            parameters: vec![],
            request_body: Some(RequestBody {
                type_meta: TypeMeta::reference("Order"),
                content_type: "application/json".into(),
                is_required: true,
            }),
            response: None,
        });

        let config = CodegenConfig::default();
        let templates = TemplateSet::builtin().unwrap();
        let files = ControllerGenerator::new(&config, &templates)
            .generate_document(&document)
            .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name(), "PetsController.cs");

        let pets = files[0].content();
        assert!(pets.contains("namespace PetStore.Http.API.Controllers;"));
        assert!(pets.contains("[HttpGet(\"/pets/{petId}\")]"));
        assert!(pets.contains(
            "public async Task<ActionResult<Pet>> GetPet([FromRoute(Name = \"petId\")] long petId)"
        ));

        let store = files[1].content();
        assert!(store.contains("PostStoreOrders([FromBody] Order body)"));
    }
}
