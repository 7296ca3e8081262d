//! Schema-document adapter: OpenAPI 3, Swagger 2 and JSON-Schema documents
//!
//! Schemas are walked as `serde_json::Value`. Named and hoisted inline types
//! land in a [`TypeTable`]; everything else refers to them by name. `$ref`
//! targets are memoized by reference id, and a reference met again while its
//! own definition is still being built resolves to a by-name reference, so
//! self-referential schemas terminate.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use super::SourceAdapter;
use crate::codegen::{operation_method_name, to_enum_variant, to_property_name, to_type_name};
use crate::error::ParseFailure;
use crate::model::{
    ApiDocument, EntityInfo, EnumMember, OperationInfo, ParameterInfo, ParameterLocation,
    PropertyInfo, PropertyMeta, RequestBody, TypeDefinition, TypeKind, TypeMeta, TypeTable,
};

/// HTTP methods in the order operations are listed
const METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options", "trace"];

const JSON: &str = "application/json";
const MULTIPART: &str = "multipart/form-data";
const FORM: &str = "application/x-www-form-urlencoded";

/// Parse JSON or YAML text into a document value
pub fn parse_document(text: &str, path: &Path) -> Result<Value, ParseFailure> {
    let failure = |reason: String| ParseFailure::new(path.display().to_string(), reason);
    let is_json = path
        .extension()
        .map_or(text.trim_start().starts_with('{'), |ext| ext == "json");
    if is_json {
        serde_json::from_str(text).map_err(|e| failure(format!("invalid JSON: {}", e)))
    } else {
        serde_yaml::from_str(text).map_err(|e| failure(format!("invalid YAML: {}", e)))
    }
}

/// Whether a value is an OpenAPI or Swagger document
pub fn is_schema_document(value: &Value) -> bool {
    value.get("openapi").is_some() || value.get("swagger").is_some()
}

/// Append one RFC 6901 segment to a JSON pointer
fn pointer(base: &str, segment: &str) -> String {
    let mut path = base.to_string();
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
    path
}

/// Last segment of a `$ref`, unescaped
fn ref_name(reference: &str) -> String {
    let segment = reference.rsplit('/').next().unwrap_or(reference);
    segment.replace("~1", "/").replace("~0", "~")
}

/// Prefix under which the document keeps its named schemas
fn schemas_prefix(document: &Value) -> &'static str {
    if document.get("swagger").is_some() || document.get("definitions").is_some() {
        "#/definitions"
    } else {
        "#/components/schemas"
    }
}

/// Resolves schemas of one document into canonical types
pub struct SchemaResolver<'a> {
    document: &'a Value,
    table: TypeTable,
    /// Resolved `$ref` targets
    resolved: BTreeMap<String, TypeMeta>,
    /// `$ref` targets whose definition is being built
    in_progress: BTreeSet<String>,
    /// Type names already claimed, by the pointer that claimed them
    names: BTreeMap<String, String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(document: &'a Value) -> Self {
        Self {
            document,
            table: TypeTable::new(),
            resolved: BTreeMap::new(),
            in_progress: BTreeSet::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn into_table(self) -> TypeTable {
        self.table
    }

    /// Resolve every named schema of the document, in document order
    pub fn resolve_all(&mut self) -> Result<(), ParseFailure> {
        let prefix = schemas_prefix(self.document);
        let Some(schemas) = self
            .lookup(prefix)
            .and_then(Value::as_object)
        else {
            return Ok(());
        };
        for name in schemas.keys() {
            self.resolve_ref(&pointer(prefix, name), prefix)?;
        }
        Ok(())
    }

    /// Resolve the named schema `name` to its type
    pub fn resolve_named(&mut self, name: &str) -> Result<TypeMeta, ParseFailure> {
        let prefix = schemas_prefix(self.document);
        self.resolve_ref(&pointer(prefix, name), prefix)
    }

    fn lookup(&self, reference: &str) -> Option<&'a Value> {
        let document: &'a Value = self.document;
        match reference.strip_prefix('#') {
            Some("") => Some(document),
            Some(pointer) => document.pointer(pointer),
            None => None,
        }
    }

    fn follow(&self, reference: &str, at: &str) -> Result<&'a Value, ParseFailure> {
        self.lookup(reference)
            .ok_or_else(|| ParseFailure::new(at, format!("unresolvable $ref `{}`", reference)))
    }

    /// Follow `$ref` chains of non-schema objects (parameters, bodies, responses)
    fn deref(&self, mut value: &'a Value, at: &str) -> Result<&'a Value, ParseFailure> {
        let mut seen = BTreeSet::new();
        while let Some(reference) = value.get("$ref").and_then(Value::as_str) {
            if !seen.insert(reference.to_string()) {
                return Err(ParseFailure::new(at, format!("cyclic $ref `{}`", reference)));
            }
            value = self.follow(reference, at)?;
        }
        Ok(value)
    }

    /// Claim a unique type name for the definition at `at`
    fn claim_name(&mut self, wanted: &str, at: &str) -> String {
        let base = to_type_name(wanted);
        let base = if base.is_empty() { "Anonymous".to_string() } else { base };
        let mut name = base.clone();
        let mut n = 2;
        while let Some(owner) = self.names.get(&name) {
            if owner == at {
                return name;
            }
            name = format!("{}{}", base, n);
            n += 1;
        }
        self.names.insert(name.clone(), at.to_string());
        name
    }

    fn resolve_ref(&mut self, reference: &str, at: &str) -> Result<TypeMeta, ParseFailure> {
        if let Some(meta) = self.resolved.get(reference) {
            return Ok(meta.clone());
        }
        let target = self.follow(reference, at)?;
        if self.in_progress.contains(reference) {
            return self.close_cycle(reference, at);
        }
        let name = self.claim_name(&ref_name(reference), reference);

        self.in_progress.insert(reference.to_string());
        let result = if target.get("$ref").is_some() {
            // Alias of another schema
            self.schema_type(target, &name, reference)
        } else if is_enum_schema(target) {
            self.define_enum(&name, target, reference)
        } else if is_object_schema(target) {
            self.define_object(&name, target, reference)
        } else {
            self.schema_type(target, &name, reference)
        };
        self.in_progress.remove(reference);

        let meta = result?;
        self.resolved.insert(reference.to_string(), meta.clone());
        Ok(meta)
    }

    /// Type of a `$ref` met again while its own definition is being built.
    ///
    /// Only an object schema gets a table entry to refer to by name, so the
    /// cycle must close on one, possibly behind a chain of aliases. Arrays,
    /// maps and primitives that contain themselves have no finite type.
    fn close_cycle(&mut self, reference: &str, at: &str) -> Result<TypeMeta, ParseFailure> {
        let mut current = reference.to_string();
        let mut seen = BTreeSet::new();
        loop {
            if !seen.insert(current.clone()) {
                return Err(ParseFailure::new(at, format!("cyclic $ref `{}`", reference)));
            }
            let target = self.follow(&current, at)?;
            match target.get("$ref").and_then(Value::as_str) {
                Some(next) => current = next.to_string(),
                None if is_object_schema(target) && !is_enum_schema(target) => break,
                None => {
                    return Err(ParseFailure::new(
                        at,
                        format!("`{}` contains itself through a non-object schema", ref_name(reference)),
                    ))
                }
            }
        }
        debug!("Cycle through {}, referring to {} by name", reference, current);
        let name = self.claim_name(&ref_name(&current), &current);
        Ok(TypeMeta::reference(name))
    }

    /// Canonical type of a schema; `context` names hoisted inline types
    pub fn schema_type(&mut self, schema: &'a Value, context: &str, at: &str) -> Result<TypeMeta, ParseFailure> {
        let nullable = is_nullable(schema);

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            let meta = self.resolve_ref(reference, at)?;
            let nullable = nullable || meta.is_nullable;
            return Ok(meta.with_nullable(nullable));
        }

        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            if let [single] = parts.as_slice() {
                let meta = self.schema_type(single, context, &pointer(at, "allOf"))?;
                let nullable = nullable || meta.is_nullable;
                return Ok(meta.with_nullable(nullable));
            }
            let name = self.claim_name(context, at);
            return Ok(self.define_object(&name, schema, at)?.with_nullable(nullable));
        }

        for key in ["oneOf", "anyOf"] {
            if let Some(variants) = schema.get(key).and_then(Value::as_array) {
                let non_null: Vec<&'a Value> = variants.iter().filter(|v| !is_null_schema(v)).collect();
                let has_null = non_null.len() < variants.len();
                return match non_null.as_slice() {
                    [single] => {
                        let meta = self.schema_type(single, context, &pointer(at, key))?;
                        let nullable = has_null || nullable || meta.is_nullable;
                        Ok(meta.with_nullable(nullable))
                    }
                    _ => Ok(TypeMeta::primitive("object").with_nullable(has_null || nullable)),
                };
            }
        }

        if is_enum_schema(schema) {
            let name = self.claim_name(context, at);
            return Ok(self.define_enum(&name, schema, at)?.with_nullable(nullable));
        }

        let meta = match schema_type_name(schema) {
            Some("array") => {
                let element = match schema.get("items") {
                    Some(items) => self.schema_type(items, &format!("{}Item", context), &pointer(at, "items"))?,
                    None => TypeMeta::primitive("object"),
                };
                TypeMeta::list(element)
            }
            Some("object") | None if schema.get("properties").is_some() => {
                let name = self.claim_name(context, at);
                self.define_object(&name, schema, at)?
            }
            Some("object") | None if schema.get("additionalProperties").is_some() => {
                let value = match schema.get("additionalProperties") {
                    Some(ap) if ap.as_object().is_some_and(|m| !m.is_empty()) => {
                        self.schema_type(ap, &format!("{}Value", context), &pointer(at, "additionalProperties"))?
                    }
                    _ => TypeMeta::primitive("object"),
                };
                TypeMeta::dictionary(TypeMeta::primitive("string"), value)
            }
            Some("string") => TypeMeta::primitive(string_format(schema)),
            Some("integer") => match schema.get("format").and_then(Value::as_str) {
                Some("int64") => TypeMeta::primitive("long"),
                _ => TypeMeta::primitive("int"),
            },
            Some("number") => match schema.get("format").and_then(Value::as_str) {
                Some("float") => TypeMeta::primitive("float"),
                Some("decimal") => TypeMeta::primitive("decimal"),
                _ => TypeMeta::primitive("double"),
            },
            Some("boolean") => TypeMeta::primitive("bool"),
            Some("file") => TypeMeta::primitive("object"),
            _ => TypeMeta::primitive("object"),
        };
        Ok(meta.with_nullable(nullable))
    }

    fn define_enum(&mut self, name: &str, schema: &'a Value, at: &str) -> Result<TypeMeta, ParseFailure> {
        let values = schema
            .get("enum")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseFailure::new(at, "enum without values"))?;
        let names = string_list(schema, &["x-enum-varnames", "x-enumNames"]);
        let descriptions = string_list(schema, &["x-enum-descriptions", "x-enumDescriptions"]);
        let is_integer = schema_type_name(schema) == Some("integer")
            || values.iter().filter(|v| !v.is_null()).all(Value::is_i64);

        let mut members = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let raw = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let member_name = names
                .get(i)
                .filter(|n| !n.is_empty())
                .map(|n| to_enum_variant(n))
                .unwrap_or_else(|| to_enum_variant(&raw));
            members.push(EnumMember {
                name: member_name,
                value: raw,
                description: descriptions.get(i).cloned().filter(|d| !d.is_empty()),
            });
        }

        self.table.insert(TypeDefinition {
            name: name.to_string(),
            comment: description(schema),
            kind: TypeKind::Enum { members, is_integer },
        });
        Ok(TypeMeta::enumeration(name))
    }

    fn define_object(&mut self, name: &str, schema: &'a Value, at: &str) -> Result<TypeMeta, ParseFailure> {
        let mut properties: Vec<PropertyMeta> = Vec::new();
        self.collect_properties(name, schema, at, &mut properties, &mut BTreeSet::new())?;
        self.table.insert(TypeDefinition {
            name: name.to_string(),
            comment: description(schema),
            kind: TypeKind::Object { properties },
        });
        Ok(TypeMeta::reference(name))
    }

    /// Properties of an object schema, `allOf` parts merged in order
    fn collect_properties(
        &mut self,
        owner: &str,
        schema: &'a Value,
        at: &str,
        out: &mut Vec<PropertyMeta>,
        seen: &mut BTreeSet<String>,
    ) -> Result<(), ParseFailure> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if !seen.insert(reference.to_string()) {
                return Ok(());
            }
            let target = self.follow(reference, at)?;
            return self.collect_properties(owner, target, reference, out, seen);
        }

        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            for (i, part) in parts.iter().enumerate() {
                let part_at = pointer(&pointer(at, "allOf"), &i.to_string());
                self.collect_properties(owner, part, &part_at, out, seen)?;
            }
        }

        let required: BTreeSet<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if let Some(props) = schema.get("properties").and_then(Value::as_object) {
            let props_at = pointer(at, "properties");
            for (prop_name, prop_schema) in props {
                let context = format!("{}{}", owner, to_property_name(prop_name));
                let type_meta = self.schema_type(prop_schema, &context, &pointer(&props_at, prop_name))?;
                let meta = PropertyMeta {
                    name: prop_name.clone(),
                    type_meta,
                    is_required: required.contains(prop_name.as_str()),
                    comment: description(prop_schema),
                    max_length: number(prop_schema, "maxLength"),
                    min_length: number(prop_schema, "minLength"),
                };
                match out.iter().position(|p| p.name == meta.name) {
                    Some(i) => out[i] = meta,
                    None => out.push(meta),
                }
            }
        }
        Ok(())
    }

    fn parameter(&mut self, value: &'a Value, operation: &str, at: &str) -> Result<Option<ParameterInfo>, ParseFailure> {
        let param = self.deref(value, at)?;
        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseFailure::new(at, "parameter without a name"))?;
        let location = match param.get("in").and_then(Value::as_str) {
            Some("path") => ParameterLocation::Path,
            Some("query") => ParameterLocation::Query,
            Some("header") => ParameterLocation::Header,
            other => {
                debug!("Skipping parameter {} in {:?}", name, other);
                return Ok(None);
            }
        };
        let context = format!("{}{}", operation, to_type_name(name));
        let type_meta = match param.get("schema") {
            Some(schema) => self.schema_type(schema, &context, &pointer(at, "schema"))?,
            // Swagger 2 keeps the type on the parameter itself
            None => self.schema_type(param, &context, at)?,
        };
        let is_required = location == ParameterLocation::Path
            || param.get("required").and_then(Value::as_bool).unwrap_or(false);
        Ok(Some(ParameterInfo {
            name: name.to_string(),
            location,
            type_meta,
            is_required,
            comment: description(param),
        }))
    }

    /// OpenAPI 3 `requestBody`
    fn request_body(&mut self, value: &'a Value, operation: &str, at: &str) -> Result<Option<RequestBody>, ParseFailure> {
        let body = self.deref(value, at)?;
        let Some(content) = body.get("content").and_then(Value::as_object) else {
            return Ok(None);
        };
        let Some((content_type, media)) = pick_media(content, &[JSON, MULTIPART, FORM]) else {
            return Ok(None);
        };
        let Some(schema) = media.get("schema") else {
            return Ok(None);
        };
        let media_at = pointer(&pointer(at, "content"), content_type);
        let type_meta = self.schema_type(schema, &format!("{}Request", operation), &pointer(&media_at, "schema"))?;
        Ok(Some(RequestBody {
            type_meta,
            content_type: if content_type == FORM { MULTIPART.to_string() } else { content_type.to_string() },
            is_required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        }))
    }

    /// Body type of the first 2xx response with a JSON schema
    fn response(&mut self, responses: &'a Value, operation: &str, at: &str) -> Result<Option<TypeMeta>, ParseFailure> {
        let Some(responses) = responses.as_object() else {
            return Ok(None);
        };
        let mut codes: Vec<&String> = responses.keys().filter(|c| c.starts_with('2')).collect();
        codes.sort();
        for code in codes {
            let response_at = pointer(at, code);
            let response = self.deref(&responses[code.as_str()], &response_at)?;
            let schema = match response.get("content").and_then(Value::as_object) {
                Some(content) => pick_media(content, &[JSON, "*/*", "text/json"])
                    .and_then(|(_, media)| media.get("schema")),
                None => response.get("schema"),
            };
            if let Some(schema) = schema {
                let meta = self.schema_type(schema, &format!("{}Response", operation), &pointer(&response_at, "schema"))?;
                return Ok(Some(meta));
            }
        }
        Ok(None)
    }

    fn operation(
        &mut self,
        path: &str,
        method: &str,
        op: &'a Value,
        shared: &[&'a Value],
        at: &str,
    ) -> Result<OperationInfo, ParseFailure> {
        let operation_id = op
            .get("operationId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let context = to_type_name(&operation_method_name(operation_id.as_deref(), method, path));

        let mut parameters: Vec<ParameterInfo> = Vec::new();
        let mut form_fields: Vec<(&'a Value, String)> = Vec::new();
        let own: Vec<&'a Value> = op
            .get("parameters")
            .and_then(Value::as_array)
            .map(|p| p.iter().collect())
            .unwrap_or_default();
        let mut request_body = None;

        for (i, value) in shared.iter().chain(own.iter()).copied().enumerate() {
            let param_at = pointer(&pointer(at, "parameters"), &i.to_string());
            let resolved = self.deref(value, &param_at)?;
            match resolved.get("in").and_then(Value::as_str) {
                Some("body") => {
                    if let Some(schema) = resolved.get("schema") {
                        let type_meta = self.schema_type(schema, &format!("{}Request", context), &pointer(&param_at, "schema"))?;
                        request_body = Some(RequestBody {
                            type_meta,
                            content_type: JSON.to_string(),
                            is_required: resolved.get("required").and_then(Value::as_bool).unwrap_or(false),
                        });
                    }
                }
                Some("formData") => form_fields.push((resolved, param_at)),
                _ => {
                    if let Some(param) = self.parameter(resolved, &context, &param_at)? {
                        // Operation-level parameters override path-level ones
                        parameters.retain(|p| !(p.name == param.name && p.location == param.location));
                        parameters.push(param);
                    }
                }
            }
        }

        if let Some(body) = op.get("requestBody") {
            request_body = self.request_body(body, &context, &pointer(at, "requestBody"))?;
        } else if !form_fields.is_empty() {
            request_body = Some(self.form_body(&context, &form_fields)?);
        }

        let response = match op.get("responses") {
            Some(responses) => self.response(responses, &context, &pointer(at, "responses"))?,
            None => None,
        };

        Ok(OperationInfo {
            operation_id,
            method: method.to_uppercase(),
            path: path.to_string(),
            tag: op
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|t| t.first())
                .and_then(Value::as_str)
                .map(to_type_name)
                .unwrap_or_else(|| "Default".to_string()),
            summary: op
                .get("summary")
                .or_else(|| op.get("description"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            parameters,
            request_body,
            response,
        })
    }

    /// Swagger 2 `formData` parameters hoisted into one multipart body type
    fn form_body(&mut self, context: &str, fields: &[(&'a Value, String)]) -> Result<RequestBody, ParseFailure> {
        let name = self.claim_name(&format!("{}Form", context), &fields[0].1);
        let mut properties = Vec::new();
        for (field, at) in fields {
            let field: &'a Value = *field;
            let prop_name = field
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| ParseFailure::new(at.as_str(), "parameter without a name"))?;
            let type_meta = self.schema_type(field, &format!("{}{}", name, to_property_name(prop_name)), at)?;
            properties.push(PropertyMeta {
                name: prop_name.to_string(),
                type_meta,
                is_required: field.get("required").and_then(Value::as_bool).unwrap_or(false),
                comment: description(field),
                max_length: number(field, "maxLength"),
                min_length: number(field, "minLength"),
            });
        }
        self.table.insert(TypeDefinition {
            name: name.clone(),
            comment: None,
            kind: TypeKind::Object { properties },
        });
        Ok(RequestBody {
            type_meta: TypeMeta::reference(name),
            content_type: MULTIPART.to_string(),
            is_required: true,
        })
    }
}

/// Build an [`ApiDocument`]: every named schema plus every operation
pub fn load_document(document: &Value, path: &Path) -> Result<ApiDocument, ParseFailure> {
    if !document.is_object() {
        return Err(ParseFailure::new(path.display().to_string(), "document is not an object"));
    }
    let mut resolver = SchemaResolver::new(document);
    resolver.resolve_all().map_err(|e| in_file(path, e))?;

    let mut operations = Vec::new();
    if let Some(paths) = document.get("paths").and_then(Value::as_object) {
        for (route, item) in paths {
            let item_at = pointer("#/paths", route);
            let item = resolver.deref(item, &item_at).map_err(|e| in_file(path, e))?;
            let shared: Vec<&Value> = item
                .get("parameters")
                .and_then(Value::as_array)
                .map(|p| p.iter().collect())
                .unwrap_or_default();
            for method in METHODS {
                if let Some(op) = item.get(*method) {
                    let op_at = pointer(&item_at, method);
                    let operation = resolver
                        .operation(route, method, op, &shared, &op_at)
                        .map_err(|e| in_file(path, e))?;
                    operations.push(operation);
                }
            }
        }
    }

    let info = document.get("info");
    let text = |key: &str| {
        info.and_then(|i| i.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Ok(ApiDocument {
        title: text("title"),
        version: text("version"),
        types: resolver.into_table(),
        operations,
    })
}

/// Names of the object schemas declared under the document's schema section
pub fn object_schema_names(document: &Value) -> Vec<String> {
    let prefix = schemas_prefix(document);
    let schemas = match prefix.strip_prefix('#').and_then(|p| document.pointer(p)) {
        Some(Value::Object(schemas)) => schemas,
        _ => return Vec::new(),
    };
    schemas
        .iter()
        .filter(|(_, schema)| is_object_schema(schema) && !is_enum_schema(schema))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Extracts one named object schema of a document as an entity
pub struct SchemaDocumentAdapter<'a> {
    document: &'a Value,
    path: &'a Path,
}

impl<'a> SchemaDocumentAdapter<'a> {
    pub fn new(document: &'a Value, path: &'a Path) -> Self {
        Self { document, path }
    }
}

impl SourceAdapter for SchemaDocumentAdapter<'_> {
    type Input = str;

    fn extract(&self, schema: &str) -> Result<EntityInfo, ParseFailure> {
        extract_entity(self.document, schema, self.path)
    }
}

/// Entity for the named object schema `schema`
pub fn extract_entity(document: &Value, schema: &str, path: &Path) -> Result<EntityInfo, ParseFailure> {
    let mut resolver = SchemaResolver::new(document);
    let meta = resolver.resolve_named(schema).map_err(|e| in_file(path, e))?;
    let table = resolver.table();
    let at = pointer(schemas_prefix(document), schema);
    let properties = match table.get(&meta.name).map(|d| &d.kind) {
        Some(TypeKind::Object { properties }) => properties,
        _ => {
            return Err(in_file(
                path,
                ParseFailure::new(at, format!("`{}` is not an object schema", schema)),
            ))
        }
    };

    let namespace = document
        .get("info")
        .and_then(|i| i.get("title"))
        .and_then(Value::as_str)
        .map(to_type_name)
        .unwrap_or_default();
    let mut entity = EntityInfo::new(meta.name.clone(), namespace);
    entity.file_path = Some(path.to_path_buf());
    entity.comment = table.get(&meta.name).and_then(|d| d.comment.clone());

    for prop in properties {
        let mut type_meta = prop.type_meta.clone();
        let inner = type_meta.innermost_mut();
        inner.is_enum = table.is_enum(&inner.name);
        let mut info = PropertyInfo::from_type(to_property_name(&prop.name), &type_meta);
        info.is_required = prop.is_required;
        info.is_nullable = type_meta.is_nullable;
        info.is_complex_type = type_meta.innermost().is_reference && !info.is_enum;
        info.max_length = prop.max_length;
        info.min_length = prop.min_length;
        info.comment_summary = prop.comment.clone();
        entity
            .add_property(info)
            .map_err(|e| in_file(path, ParseFailure::new(at.clone(), e.reason)))?;
    }
    Ok(entity)
}

/// Qualify a JSON-pointer failure with the document's file path
fn in_file(path: &Path, failure: ParseFailure) -> ParseFailure {
    ParseFailure::new(format!("{}{}", path.display(), failure.path), failure.reason)
}

fn schema_type_name(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // OpenAPI 3.1: ["string", "null"]
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}

fn is_nullable(schema: &Value) -> bool {
    schema.get("nullable").and_then(Value::as_bool).unwrap_or(false)
        || schema.get("x-nullable").and_then(Value::as_bool).unwrap_or(false)
        || matches!(schema.get("type"), Some(Value::Array(types)) if types.iter().any(|t| t == "null"))
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn is_enum_schema(schema: &Value) -> bool {
    schema.get("enum").is_some_and(Value::is_array)
}

fn is_object_schema(schema: &Value) -> bool {
    schema.get("properties").is_some()
        || (schema.get("allOf").is_some() && schema.get("$ref").is_none())
        || (schema_type_name(schema) == Some("object") && schema.get("additionalProperties").is_none())
}

fn string_format(schema: &Value) -> &'static str {
    match schema.get("format").and_then(Value::as_str) {
        Some("date-time") => "DateTime",
        Some("date") => "DateOnly",
        Some("time") => "TimeOnly",
        Some("uuid") => "Guid",
        Some("binary") => "object",
        _ => "string",
    }
}

fn description(schema: &Value) -> Option<String> {
    schema
        .get("description")
        .or_else(|| schema.get("title"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn number(schema: &Value, key: &str) -> Option<u32> {
    schema
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn string_list(schema: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| schema.get(*k).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn pick_media<'v>(content: &'v Map<String, Value>, preferred: &[&'static str]) -> Option<(&'static str, &'v Value)> {
    preferred
        .iter()
        .find_map(|ct| content.get(*ct).map(|media| (*ct, media)))
}
