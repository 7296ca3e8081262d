//! Client generator - typed API clients (TypeScript, C#) from schema documents

use heck::ToPascalCase;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::{CodegenError, Result};
use crate::model::{
    ApiDocument, GenFileInfo, OperationInfo, ParameterInfo, ParameterLocation, PropertyInfo,
    TypeDefinition, TypeKind, TypeMeta,
};
use crate::projection::{Target, TypeFormatter};

use super::dto_generator::{one_line, FieldData};
use super::manager_generator::{join_namespace, usings};
use super::naming::{dir_name, file_stem, operation_method_name, parameter_name, to_type_name};
use super::template::TemplateSet;
use super::ArtifactKind;

/// A query or header value sent by an operation
#[derive(Debug, Clone, Serialize)]
struct ValueParam {
    /// Name on the wire
    name: String,
    variable: String,
}

#[derive(Debug, Clone, Serialize)]
struct ClientOperation {
    name: String,
    summary: String,
    method: String,
    parameters: String,
    /// Response type, or empty when the operation returns no body
    return_type: String,
    /// Path with parameters interpolated, in the target's string syntax
    path: String,
    query: Vec<ValueParam>,
    headers: Vec<ValueParam>,
    /// `json`, `multipart` or empty
    body_kind: &'static str,
}

#[derive(Serialize)]
struct ServiceTemplateData {
    namespace: String,
    imports: Vec<String>,
    class_name: String,
    tag: String,
    operations: Vec<ClientOperation>,
}

#[derive(Debug, Clone, Serialize)]
struct ModelField {
    #[serde(flatten)]
    field: FieldData,
    /// Property key as written in the model
    key: String,
}

#[derive(Debug, Clone, Serialize)]
struct EnumMemberData {
    name: String,
    value: String,
    raw: String,
    description: String,
}

#[derive(Serialize)]
struct ModelTemplateData {
    namespace: String,
    imports: Vec<String>,
    type_name: String,
    summary: String,
    is_enum: bool,
    is_integer: bool,
    fields: Vec<ModelField>,
    members: Vec<EnumMemberData>,
}

#[derive(Serialize)]
struct IndexTemplateData {
    modules: Vec<String>,
}

/// Generates service and model files for one schema document
pub struct ClientGenerator<'a> {
    config: &'a CodegenConfig,
    templates: &'a TemplateSet,
    target: Target,
}

impl<'a> ClientGenerator<'a> {
    pub fn new(config: &'a CodegenConfig, templates: &'a TemplateSet) -> Self {
        Self {
            config,
            templates,
            target: config.client_target,
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn generate(&self, document: &ApiDocument) -> Result<Vec<GenFileInfo>> {
        if !ArtifactKind::Client.supports(self.target) {
            return Err(CodegenError::UnsupportedTarget {
                artifact: ArtifactKind::Client.label(),
                target: self.target.to_string(),
            });
        }
        let root = self
            .config
            .naming
            .root_namespace_or(&to_type_name(&document.title))?;

        let mut files = Vec::new();
        for tag in document.tags() {
            files.push(self.service(document, &tag, &root)?);
        }
        for definition in document.types.iter() {
            files.push(self.model(definition, &root)?);
        }
        if self.target == Target::TypeScript && !document.types.is_empty() {
            let modules = document
                .types
                .iter()
                .map(|d| format!("{}.model", file_stem(Target::TypeScript, &d.name)))
                .collect();
            let content = self
                .templates
                .render("client_index.ts.j2", IndexTemplateData { modules })?;
            files.push(GenFileInfo::new(
                "index.ts",
                self.models_dir().join("index.ts"),
                content,
            ));
        }
        debug!("Generated {} client files", files.len());
        Ok(files)
    }

    fn services_dir(&self) -> PathBuf {
        let name = match self.target {
            Target::CSharp => "Services",
            _ => "services",
        };
        self.config.naming.client_dir.join(name)
    }

    fn models_dir(&self) -> PathBuf {
        let name = match self.target {
            Target::CSharp => "Models",
            _ => "models",
        };
        self.config.naming.client_dir.join(name)
    }

    fn service(&self, document: &ApiDocument, tag: &str, root: &str) -> Result<GenFileInfo> {
        let class_name = format!("{}Service", to_type_name(tag));
        let operations: Vec<&OperationInfo> = document.operations_for(tag).collect();

        let mut references = BTreeSet::new();
        for op in &operations {
            for meta in op.signature_types() {
                meta.collect_references(&mut references);
            }
        }

        let models_namespace =
            join_namespace(&[root, &self.config.naming.client_namespace, "Models"]);
        let (namespace, imports, template) = match self.target {
            Target::CSharp => (
                join_namespace(&[root, &self.config.naming.client_namespace, "Services"]),
                usings(&[
                    "System",
                    "System.Collections.Generic",
                    "System.Net.Http",
                    "System.Net.Http.Json",
                    "System.Threading.Tasks",
                    &models_namespace,
                ]),
                "client_service.cs.j2",
            ),
            _ => {
                let imports = if references.is_empty() {
                    Vec::new()
                } else {
                    let names: Vec<String> = references.into_iter().collect();
                    vec![format!("import {{ {} }} from '../models';", names.join(", "))]
                };
                (String::new(), imports, "client_service.ts.j2")
            }
        };

        let data = ServiceTemplateData {
            namespace,
            imports,
            class_name: class_name.clone(),
            tag: tag.to_string(),
            operations: operations.iter().map(|op| self.operation(op)).collect(),
        };
        let content = self.templates.render(template, &data)?;

        let file_name = match self.target {
            Target::CSharp => format!("{}.cs", class_name),
            _ => format!("{}.service.ts", dir_name(Target::TypeScript, tag)),
        };
        Ok(GenFileInfo::new(
            file_name.clone(),
            self.services_dir().join(file_name),
            content,
        ))
    }

    fn operation(&self, op: &OperationInfo) -> ClientOperation {
        let formatter = self.target.formatter();
        let base_name = operation_method_name(op.operation_id.as_deref(), &op.method, &op.path);
        let name = match self.target {
            Target::CSharp => format!("{}Async", base_name.to_pascal_case()),
            _ => base_name,
        };

        // Required parameters first; optional ones trail with defaults
        let mut required = Vec::new();
        let mut optional = Vec::new();
        for location in [
            ParameterLocation::Path,
            ParameterLocation::Query,
            ParameterLocation::Header,
        ] {
            for param in op.parameters_in(location) {
                let is_required = param.is_required || location == ParameterLocation::Path;
                let declaration = self.declare(
                    formatter,
                    &variable(self.target, &param.name),
                    &param.type_meta,
                    is_required,
                );
                if is_required {
                    required.push(declaration);
                } else {
                    optional.push(declaration);
                }
            }
        }

        let body_kind = match &op.request_body {
            Some(body) if body.is_multipart() => {
                let declaration = match self.target {
                    Target::CSharp => "MultipartFormDataContent form".to_string(),
                    _ => "form: FormData".to_string(),
                };
                required.push(declaration);
                "multipart"
            }
            Some(body) => {
                let declaration = self.declare(formatter, "body", &body.type_meta, body.is_required);
                if body.is_required {
                    required.push(declaration);
                } else {
                    optional.push(declaration);
                }
                "json"
            }
            None => "",
        };
        required.extend(optional);

        ClientOperation {
            name,
            summary: one_line(op.summary.as_deref()),
            method: op.method.clone(),
            parameters: required.join(", "),
            return_type: op
                .response
                .as_ref()
                .map(|meta| formatter.format_meta(meta))
                .unwrap_or_default(),
            path: self.path_expression(op),
            query: self.values(op.parameters_in(ParameterLocation::Query)),
            headers: self.values(op.parameters_in(ParameterLocation::Header)),
            body_kind,
        }
    }

    /// Parameter declaration in the target's syntax
    fn declare(
        &self,
        formatter: &dyn TypeFormatter,
        name: &str,
        meta: &TypeMeta,
        is_required: bool,
    ) -> String {
        match self.target {
            Target::CSharp if is_required => format!("{} {}", formatter.format_meta(meta), name),
            Target::CSharp => {
                let meta = meta.clone().with_nullable(true);
                format!("{} {} = null", formatter.format_meta(&meta), name)
            }
            _ if is_required => format!("{}: {}", name, formatter.format_meta(meta)),
            _ => {
                let meta = meta.clone().with_nullable(true);
                format!("{}?: {}", name, formatter.format_meta(&meta))
            }
        }
    }

    fn values<'p>(&self, params: impl Iterator<Item = &'p ParameterInfo>) -> Vec<ValueParam> {
        params
            .map(|p| ValueParam {
                name: p.name.clone(),
                variable: variable(self.target, &p.name),
            })
            .collect()
    }

    /// `/pets/{petId}` with the parameter spliced in, escaped
    fn path_expression(&self, op: &OperationInfo) -> String {
        let mut out = String::new();
        let mut rest = op.path.as_str();
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);
            let var = variable(self.target, &rest[start + 1..start + len]);
            match self.target {
                Target::CSharp => {
                    out.push_str(&format!("{{Uri.EscapeDataString({}.ToString()!)}}", var))
                }
                _ => out.push_str(&format!("${{encodeURIComponent(String({}))}}", var)),
            }
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        out
    }

    fn model(&self, definition: &TypeDefinition, root: &str) -> Result<GenFileInfo> {
        let mut data = ModelTemplateData {
            namespace: join_namespace(&[root, &self.config.naming.client_namespace, "Models"]),
            imports: Vec::new(),
            type_name: definition.name.clone(),
            summary: one_line(definition.comment.as_deref()),
            is_enum: definition.is_enum(),
            is_integer: false,
            fields: Vec::new(),
            members: Vec::new(),
        };

        match &definition.kind {
            TypeKind::Object { properties } => {
                for meta in properties {
                    let mut prop = PropertyInfo::from_type(meta.name.clone(), &meta.type_meta);
                    prop.is_required = meta.is_required;
                    prop.is_nullable = meta.type_meta.is_nullable || !meta.is_required;
                    prop.comment_summary = meta.comment.clone();
                    prop.max_length = meta.max_length;
                    prop.min_length = meta.min_length;
                    data.fields.push(ModelField {
                        field: FieldData::new(self.target, &prop),
                        key: model_key(self.target, &meta.name),
                    });
                }
                let mut references = definition.references();
                references.remove(&definition.name);
                data.imports = match self.target {
                    Target::CSharp => usings(&[
                        "System",
                        "System.Collections.Generic",
                        "System.Text.Json.Serialization",
                    ]),
                    _ => references
                        .iter()
                        .map(|name| {
                            format!(
                                "import {{ {} }} from './{}.model';",
                                name,
                                file_stem(Target::TypeScript, name)
                            )
                        })
                        .collect(),
                };
            }
            TypeKind::Enum { members, is_integer } => {
                data.is_integer = *is_integer;
                data.members = members
                    .iter()
                    .map(|m| EnumMemberData {
                        name: m.name.clone(),
                        value: if *is_integer {
                            m.value.clone()
                        } else {
                            format!("'{}'", m.value.replace('\'', "\\'"))
                        },
                        raw: m.value.replace('"', "\\\""),
                        description: one_line(m.description.as_deref()),
                    })
                    .collect();
                if self.target == Target::CSharp {
                    data.imports = usings(&[
                        "System.Runtime.Serialization",
                        "System.Text.Json.Serialization",
                    ]);
                }
            }
        }

        let (file_name, template) = match self.target {
            Target::CSharp => (format!("{}.cs", definition.name), "client_model.cs.j2"),
            _ => (
                format!("{}.model.ts", file_stem(Target::TypeScript, &definition.name)),
                "client_model.ts.j2",
            ),
        };
        let content = self.templates.render(template, &data)?;
        Ok(GenFileInfo::new(
            file_name.clone(),
            self.models_dir().join(file_name),
            content,
        ))
    }
}

fn variable(target: Target, name: &str) -> String {
    parameter_name(target, name)
}

/// Wire name as a TypeScript property key, quoted when not an identifier
fn model_key(target: Target, name: &str) -> String {
    let is_identifier = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    match target {
        Target::TypeScript if !is_identifier => format!("'{}'", name.replace('\'', "\\'")),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumMember, PropertyMeta, RequestBody};

    fn document() -> ApiDocument {
        let mut document = ApiDocument {
            title: "Pet Store".into(),
            version: "1.0".into(),
            ..Default::default()
        };
        document.types.insert(TypeDefinition {
            name: "Pet".into(),
            comment: Some("A pet".into()),
            kind: TypeKind::Object {
                properties: vec![
                    PropertyMeta {
                        name: "id".into(),
                        type_meta: TypeMeta::primitive("long"),
                        is_required: true,
                        comment: None,
                        max_length: None,
                        min_length: None,
                    },
                    PropertyMeta {
                        name: "status".into(),
                        type_meta: TypeMeta::enumeration("PetStatus"),
                        is_required: false,
                        comment: None,
                        max_length: None,
                        min_length: None,
                    },
                    PropertyMeta {
                        name: "x-tag".into(),
                        type_meta: TypeMeta::list(TypeMeta::primitive("string")),
                        is_required: true,
                        comment: None,
                        max_length: None,
                        min_length: None,
                    },
                ],
            },
        });
        document.types.insert(TypeDefinition {
            name: "PetStatus".into(),
            comment: None,
            kind: TypeKind::Enum {
                members: vec![
                    EnumMember {
                        name: "Available".into(),
                        value: "available".into(),
                        description: None,
                    },
                    EnumMember {
                        name: "Sold".into(),
                        value: "sold".into(),
                        description: Some("No longer available".into()),
                    },
                ],
                is_integer: false,
            },
        });
        document.operations.push(OperationInfo {
            operation_id: Some("getPet".into()),
            method: "GET".into(),
            path: "/pets/{petId}".into(),
            tag: "pets".into(),
            summary: Some("Find a pet".into()),
            parameters: vec![
                ParameterInfo {
                    name: "petId".into(),
                    location: ParameterLocation::Path,
                    type_meta: TypeMeta::primitive("long"),
                    is_required: true,
                    comment: None,
                },
                ParameterInfo {
                    name: "verbose".into(),
                    location: ParameterLocation::Query,
                    type_meta: TypeMeta::primitive("bool"),
                    is_required: false,
                    comment: None,
                },
            ],
            request_body: None,
            response: Some(TypeMeta::reference("Pet")),
        });
        document.operations.push(OperationInfo {
            operation_id: Some("addPet".into()),
            method: "POST".into(),
            path: "/pets".into(),
            tag: "pets".into(),
            summary: None,
            parameters: vec![],
            request_body: Some(RequestBody {
                type_meta: TypeMeta::reference("Pet"),
                content_type: "application/json".into(),
                is_required: true,
            }),
            response: None,
        });
        document
    }

    #[test]
    fn test_typescript_client() {
        let config = CodegenConfig::default();
        let templates = TemplateSet::builtin().unwrap();
        let files = ClientGenerator::new(&config, &templates)
            .generate(&document())
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["pets.service.ts", "pet.model.ts", "pet-status.model.ts", "index.ts"]
        );
        assert_eq!(
            files[0].full_name(),
            std::path::Path::new("ClientServices/services/pets.service.ts")
        );

        let service = files[0].content();
        assert!(service.contains("import { Pet } from '../models';"));
        assert!(service.contains("export class PetsService {"));
        assert!(service.contains("async getPet(petId: number, verbose?: boolean | null): Promise<Pet> {"));
        assert!(service.contains("`/pets/${encodeURIComponent(String(petId))}`"));
        assert!(service.contains("if (verbose != null) query.set('verbose', String(verbose));"));
        assert!(service.contains("async addPet(body: Pet): Promise<void> {"));

        let pet = files[1].content();
        assert!(pet.contains("import { PetStatus } from './pet-status.model';"));
        assert!(pet.contains("export interface Pet {"));
        assert!(pet.contains("  id: number;"));
        assert!(pet.contains("  status?: PetStatus | null;"));
        assert!(pet.contains("  'x-tag': string[];"));

        let status = files[2].content();
        assert!(status.contains("export enum PetStatus {"));
        assert!(status.contains("  Available = 'available',"));

        assert!(files[3].content().contains("export * from './pet-status.model';"));
    }

    #[test]
    fn test_csharp_client() {
        let config = CodegenConfig::default();
        let templates = TemplateSet::builtin().unwrap();
        let files = ClientGenerator::new(&config, &templates)
            .with_target(Target::CSharp)
            .generate(&document())
            .unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["PetsService.cs", "Pet.cs", "PetStatus.cs"]);

        let service = files[0].content();
        assert!(service.contains("namespace PetStore.ClientServices.Services;"));
        assert!(service.contains("using PetStore.ClientServices.Models;"));
        assert!(service.contains("public async Task<Pet?> GetPetAsync(long petId, bool? verbose = null)"));
        assert!(service.contains("$\"/pets/{Uri.EscapeDataString(petId.ToString()!)}\""));
        assert!(service.contains("public async Task AddPetAsync(Pet body)"));

        let pet = files[1].content();
        assert!(pet.contains("[JsonPropertyName(\"x-tag\")]"));
        assert!(pet.contains("public List<string> XTag { get; set; } = new();"));
        assert!(pet.contains("public PetStatus? Status { get; set; }"));

        let status = files[2].content();
        assert!(status.contains("[EnumMember(Value = \"sold\")]"));
    }

    #[test]
    fn test_rust_client_unsupported() {
        let config = CodegenConfig::default();
        let templates = TemplateSet::builtin().unwrap();
        let result = ClientGenerator::new(&config, &templates)
            .with_target(Target::Rust)
            .generate(&document());
        assert!(matches!(result, Err(CodegenError::UnsupportedTarget { .. })));
    }
}
