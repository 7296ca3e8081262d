//! crudforge-codegen: Generate DTOs, managers, controllers and API clients
//! from entity declarations, relational DDL and OpenAPI documents
//!
//! Every input is normalized into one canonical type model
//! ([`model::EntityInfo`], [`model::ApiDocument`]); generators project that
//! model into C#, TypeScript or Rust source through `minijinja` templates.
//!
//! Accepted inputs:
//!
//! - `.rs`: `struct`/`enum` items, annotated with `#[crud(...)]`
//! - `.json`: one class declaration record or a list of them
//! - `.sql`: MySQL `CREATE TABLE` statements, with relationships from foreign keys
//! - `.json` / `.yaml` / `.yml`: OpenAPI 3 or Swagger 2 documents
//!
//! # Usage in build.rs
//!
//! ```rust,ignore
//! fn main() {
//!     let out_dir = std::env::var("OUT_DIR").unwrap();
//!     crudforge_codegen::CodegenBuilder::new("entities.rs")
//!         .dto_target(crudforge_codegen::projection::Target::Rust)
//!         .output_dir(&out_dir)
//!         .generate()
//!         .expect("Failed to generate DTOs");
//!
//!     println!("cargo:rerun-if-changed=entities.rs");
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! crudforge --entity schema.sql --output ./generated generate
//! crudforge --entity petstore.yaml --target typescript client
//! ```

pub mod adapter;
pub mod codegen;
pub mod config;
pub mod emit;
pub mod error;
pub mod model;
pub mod projection;

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use adapter::{ClassDeclaration, DeclarationAdapter, MappingModel, SourceInput};
use codegen::{ArtifactKind, CodeGenerator};
use model::{ApiDocument, EntityInfo, GenFileInfo};
use projection::Target;

pub use config::CodegenConfig;
pub use emit::{EmitReport, FailedFile, SkippedFile, WrittenFile};
pub use error::{CodegenError, ParseFailure, Result};

/// A parsed input file
#[derive(Debug, Clone)]
pub enum ParsedSource {
    /// Class declarations, from Rust source or declaration records
    Declarations(Vec<ClassDeclaration>),
    /// DDL: the mapping model plus the declarations synthesized from it
    Relational {
        model: MappingModel,
        declarations: Vec<ClassDeclaration>,
    },
    /// An OpenAPI or Swagger document
    Document(Value),
}

/// Everything extracted from a set of input files
#[derive(Debug, Default)]
pub struct LoadedSources {
    pub entities: Vec<EntityInfo>,
    pub documents: Vec<ApiDocument>,
    pub failures: Vec<ParseFailure>,
}

/// Reads and parses input files, caching each path for the loader's lifetime
#[derive(Debug, Default)]
pub struct SourceLoader {
    cache: BTreeMap<PathBuf, ParsedSource>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one file, choosing the front end by extension
    pub fn parse(&mut self, path: &Path) -> std::result::Result<&ParsedSource, ParseFailure> {
        if !self.cache.contains_key(path) {
            let parsed = parse_source(path)?;
            self.cache.insert(path.to_path_buf(), parsed);
        }
        self.cache
            .get(path)
            .ok_or_else(|| ParseFailure::new(path.display().to_string(), "source vanished from cache"))
    }

    /// Load entities and documents from `paths`, in input order.
    ///
    /// Declarations from all `.rs` and declaration `.json` inputs share one
    /// context, so entities in different files can refer to each other.
    /// Failures are collected per input and never stop the batch.
    pub fn load(&mut self, paths: &[PathBuf]) -> LoadedSources {
        let mut loaded = LoadedSources::default();

        let mut parsed: Vec<&PathBuf> = Vec::new();
        for path in paths {
            if parsed.contains(&path) {
                debug!("{} listed twice, loading once", path.display());
                continue;
            }
            match self.parse(path) {
                Ok(_) => parsed.push(path),
                Err(failure) => {
                    warn!("Skipping {}: {}", path.display(), failure.reason);
                    loaded.failures.push(failure);
                }
            }
        }

        let context = DeclarationAdapter::from_declarations(parsed.iter().flat_map(|path| {
            match self.cache.get(path.as_path()) {
                Some(ParsedSource::Declarations(declarations)) => declarations.as_slice(),
                _ => &[][..],
            }
        }));

        for path in parsed {
            let Some(source) = self.cache.get(path.as_path()) else {
                continue;
            };
            match source {
                ParsedSource::Declarations(declarations) => {
                    for declaration in declarations.iter().filter(|d| !d.is_enum()) {
                        push_entity(
                            &mut loaded,
                            path,
                            adapter::extract(SourceInput::Declaration {
                                declaration,
                                context: &context,
                            }),
                        );
                    }
                }
                ParsedSource::Relational { model, declarations } => {
                    let context = DeclarationAdapter::from_declarations(declarations);
                    for declaration in declarations.iter().filter(|d| !d.is_enum()) {
                        push_entity(
                            &mut loaded,
                            path,
                            adapter::extract(SourceInput::Relational {
                                declaration,
                                context: &context,
                                model,
                            }),
                        );
                    }
                }
                ParsedSource::Document(document) => {
                    match adapter::load_document(document, path) {
                        Ok(api) => {
                            debug!(
                                "{}: {} types, {} operations",
                                path.display(),
                                api.types.len(),
                                api.operations.len()
                            );
                            loaded.documents.push(api);
                        }
                        Err(failure) => {
                            warn!("{}", failure);
                            loaded.failures.push(failure);
                        }
                    }
                    // Object schemas resolve independently of the document
                    for schema in adapter::object_schema_names(document) {
                        push_entity(
                            &mut loaded,
                            path,
                            adapter::extract(SourceInput::SchemaDocument {
                                document,
                                schema: &schema,
                                path,
                            }),
                        );
                    }
                }
            }
        }

        info!(
            "Loaded {} entities and {} documents ({} failures)",
            loaded.entities.len(),
            loaded.documents.len(),
            loaded.failures.len()
        );
        loaded
    }
}

/// Record one extraction result.
///
/// Entity names are unique within a run: a second entity with a name already
/// loaded is a failure naming both sources. A failure already recorded (a
/// document-level failure repeated by its schema) is not recorded twice.
fn push_entity(loaded: &mut LoadedSources, path: &Path, result: std::result::Result<EntityInfo, ParseFailure>) {
    let failure = match result {
        Ok(mut entity) => {
            if entity.file_path.is_none() {
                entity.file_path = Some(path.to_path_buf());
            }
            match loaded.entities.iter().find(|e| e.name == entity.name) {
                None => {
                    debug!("Extracted {} ({} properties)", entity.name, entity.property_infos.len());
                    loaded.entities.push(entity);
                    return;
                }
                Some(first) => {
                    let first_path = first
                        .file_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    ParseFailure::new(
                        path.display().to_string(),
                        format!("duplicate entity `{}`, already declared in {}", entity.name, first_path),
                    )
                }
            }
        }
        Err(failure) => failure,
    };
    if loaded.failures.contains(&failure) {
        return;
    }
    warn!("{}", failure);
    loaded.failures.push(failure);
}

fn parse_source(path: &Path) -> std::result::Result<ParsedSource, ParseFailure> {
    let failure = |reason: String| ParseFailure::new(path.display().to_string(), reason);
    let text = fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    debug!("Parsing {} as .{}", path.display(), extension);
    match extension.as_str() {
        "rs" => adapter::parse_rust_source(&text, path).map(ParsedSource::Declarations),
        "sql" => {
            let model = adapter::parse_ddl(&text, path)?;
            let namespace = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(codegen::to_type_name)
                .unwrap_or_default();
            let declarations = adapter::declarations_from_model(&model, &namespace);
            Ok(ParsedSource::Relational { model, declarations })
        }
        "json" | "yaml" | "yml" => {
            let value = adapter::parse_document(&text, path)?;
            if adapter::is_schema_document(&value) {
                return Ok(ParsedSource::Document(value));
            }
            if extension != "json" {
                return Err(failure("not an OpenAPI or Swagger document".to_string()));
            }
            declaration_records(value, path).map(ParsedSource::Declarations)
        }
        other => Err(failure(format!("unsupported input type `.{}`", other))),
    }
}

/// One declaration record or a list of them
fn declaration_records(value: Value, path: &Path) -> std::result::Result<Vec<ClassDeclaration>, ParseFailure> {
    let records = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    records
        .into_iter()
        .map(|record| {
            let mut declaration: ClassDeclaration = serde_json::from_value(record)
                .map_err(|e| ParseFailure::new(path.display().to_string(), e.to_string()))?;
            declaration.file_path = Some(path.to_path_buf());
            Ok(declaration)
        })
        .collect()
}

/// Filter entities based on include/exclude patterns
fn filter_entities(entities: Vec<EntityInfo>, include: &str, exclude: &str) -> Vec<EntityInfo> {
    let include_all = include.trim() == "*" || include.trim().is_empty();
    let include_set: HashSet<String> = if include_all {
        HashSet::new()
    } else {
        include.split(',').map(|s| s.trim().to_string()).collect()
    };
    let exclude_set: HashSet<String> = exclude
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    entities
        .into_iter()
        .filter(|e| {
            let name = &e.name;
            let included = include_all || include_set.contains(name);
            let excluded = exclude_set.contains(name);
            included && !excluded
        })
        .collect()
}

/// Generated files of one run, before emission
#[derive(Debug, Default)]
pub struct GenerationOutput {
    pub files: Vec<GenFileInfo>,
    pub failures: Vec<ParseFailure>,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files: Vec<GenFileInfo>,
    pub emitted: EmitReport,
    pub failures: Vec<ParseFailure>,
}

/// Load every configured input and render every configured artifact
pub fn generate_files(config: &CodegenConfig) -> Result<GenerationOutput> {
    config.validate()?;
    let sources = SourceLoader::new().load(&config.entity_paths);

    let entities = filter_entities(sources.entities, &config.include_entities, &config.exclude_entities);
    debug!(
        "After filtering: {} entities (include={}, exclude={})",
        entities.len(),
        config.include_entities,
        config.exclude_entities
    );

    let generator = CodeGenerator::new(config)?;
    let mut output = GenerationOutput {
        files: Vec::new(),
        failures: sources.failures,
    };
    for entity in &entities {
        match generator.generate_entity(entity) {
            Ok(files) => output.files.extend(files),
            Err(CodegenError::Parse(failure)) => output.failures.push(failure),
            Err(err) => return Err(err),
        }
    }
    for document in &sources.documents {
        output.files.extend(generator.generate_document(document)?);
    }

    info!("Generated {} files", output.files.len());
    Ok(output)
}

/// Main entry point for code generation
pub fn generate(config: &CodegenConfig) -> Result<GenerationReport> {
    let output = generate_files(config)?;
    let emitted = if config.dry_run {
        info!("Dry run, nothing written");
        emit::plan(&output.files, &config.output_dir, config.force)
    } else {
        emit::emit(&output.files, &config.output_dir, config.force)?
    };
    info!("Code generation complete");
    Ok(GenerationReport {
        files: output.files,
        emitted,
        failures: output.failures,
    })
}

/// Builder pattern for easy configuration in build.rs
pub struct CodegenBuilder {
    config: CodegenConfig,
}

impl CodegenBuilder {
    /// Create a new builder reading the given entity source
    pub fn new(entity_path: impl AsRef<Path>) -> Self {
        Self {
            config: CodegenConfig::default_with_entity(entity_path.as_ref().to_path_buf()),
        }
    }

    /// Add another entity source
    pub fn entity(mut self, path: impl AsRef<Path>) -> Self {
        self.config.entity_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Set the root directory generated paths are relative to
    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the DTO directory, relative to the output directory
    pub fn dto_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.naming.dto_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the artifacts to generate
    pub fn artifacts(mut self, artifacts: &[ArtifactKind]) -> Self {
        self.config.artifacts = artifacts.to_vec();
        self
    }

    pub fn dto_target(mut self, target: Target) -> Self {
        self.config.dto_target = target;
        self
    }

    pub fn client_target(mut self, target: Target) -> Self {
        self.config.client_target = target;
        self
    }

    pub fn root_namespace(mut self, namespace: &str) -> Self {
        self.config.naming.root_namespace = Some(namespace.to_string());
        self
    }

    /// Set entities to include
    pub fn include_entities(mut self, entities: &[&str]) -> Self {
        self.config.include_entities = entities.join(",");
        self
    }

    /// Set entities to exclude
    pub fn exclude_entities(mut self, entities: &[&str]) -> Self {
        self.config.exclude_entities = entities.join(",");
        self
    }

    /// Overwrite existing files
    pub fn force(mut self) -> Self {
        self.config.force = true;
        self
    }

    /// Enable dry run mode (preview without writing files)
    pub fn dry_run(mut self) -> Self {
        self.config.dry_run = true;
        self
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Generate the code
    pub fn generate(self) -> Result<GenerationReport> {
        generate(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ENTITIES: &str = r#"
        /// A blog
        #[crud(namespace = "Shop.Entities")]
        pub struct Blog {
            #[crud(key)]
            pub id: i64,
            #[crud(required, max_length = 100)]
            pub title: String,
            pub posts: Vec<Post>,
        }

        #[crud(namespace = "Shop.Entities")]
        pub struct Post {
            pub id: i64,
            pub blog_id: i64,
            #[crud(required)]
            pub blog: Blog,
        }
    "#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_filter_entities() {
        let entities = vec![
            EntityInfo::new("Blog", "Shop"),
            EntityInfo::new("Post", "Shop"),
            EntityInfo::new("Tag", "Shop"),
        ];
        let names = |list: Vec<EntityInfo>| list.into_iter().map(|e| e.name).collect::<Vec<_>>();
        assert_eq!(names(filter_entities(entities.clone(), "*", "")), vec!["Blog", "Post", "Tag"]);
        assert_eq!(names(filter_entities(entities.clone(), "Blog, Tag", "")), vec!["Blog", "Tag"]);
        assert_eq!(names(filter_entities(entities, "*", "Post")), vec!["Blog", "Tag"]);
    }

    #[test]
    fn test_loader_shares_context_across_files() {
        let dir = TempDir::new().unwrap();
        let entities = write(dir.path(), "entities.rs", ENTITIES);
        let records = write(
            dir.path(),
            "comments.json",
            r#"[{ "name": "Comment", "namespace": "Shop.Entities",
                  "properties": [ { "name": "Post", "type": "Post" }, { "name": "Body", "type": "string" } ] }]"#,
        );

        let loaded = SourceLoader::new().load(&[entities, records]);
        assert!(loaded.failures.is_empty(), "{:?}", loaded.failures);
        let names: Vec<_> = loaded.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Blog", "Post", "Comment"]);
        assert!(loaded.entities[2].property("Post").unwrap().is_navigation);
    }

    #[test]
    fn test_failures_are_local() {
        let dir = TempDir::new().unwrap();
        let good = write(dir.path(), "entities.rs", ENTITIES);
        let bad = write(dir.path(), "broken.rs", "pub struct {");
        let odd = write(dir.path(), "notes.txt", "hello");

        let loaded = SourceLoader::new().load(&[bad, good, odd]);
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.failures.len(), 2);
        assert!(loaded.failures[0].path.ends_with("broken.rs"));
        assert!(loaded.failures[1].reason.contains(".txt"));
    }

    #[test]
    fn test_generate_writes_and_skips() {
        let dir = TempDir::new().unwrap();
        let entities = write(dir.path(), "entities.rs", ENTITIES);
        let out = dir.path().join("out");

        let report = CodegenBuilder::new(&entities)
            .output_dir(&out)
            .artifacts(&[ArtifactKind::Dto, ArtifactKind::Manager])
            .generate()
            .unwrap();
        // 5 DTOs + 1 manager per entity
        assert_eq!(report.files.len(), 12);
        assert_eq!(report.emitted.written.len(), 12);
        assert!(out.join("Share/Models/BlogDtos/BlogAddDto.cs").exists());

        let again = CodegenBuilder::new(&entities)
            .output_dir(&out)
            .artifacts(&[ArtifactKind::Dto, ArtifactKind::Manager])
            .generate()
            .unwrap();
        assert!(again.emitted.written.is_empty());
        assert_eq!(again.emitted.skipped.len(), 12);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let entities = write(dir.path(), "entities.rs", ENTITIES);
        let out = dir.path().join("out");

        let report = CodegenBuilder::new(&entities).output_dir(&out).dry_run().generate().unwrap();
        assert_eq!(report.emitted.written.len(), 10);
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_namespace_is_fatal() {
        let dir = TempDir::new().unwrap();
        let entities = write(dir.path(), "entities.rs", "pub struct Loose { pub id: i64 }");
        let result = CodegenBuilder::new(&entities).output_dir(dir.path()).generate();
        assert!(matches!(result, Err(CodegenError::ConfigError(_))));
    }
}
