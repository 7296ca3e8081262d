//! Configuration settings for crudforge-codegen

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::defaults;
use crate::codegen::ArtifactKind;
use crate::error::{CodegenError, Result};
use crate::model::EntityInfo;
use crate::projection::Target;

/// Main configuration struct for code generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Entity sources: `.rs`, `.sql`, declaration `.json`, or OpenAPI `.json`/`.yaml`
    #[serde(default)]
    pub entity_paths: Vec<PathBuf>,

    /// Entities to include (comma-separated, or "*" for all)
    #[serde(default = "default_include_entities")]
    pub include_entities: String,

    /// Entities to exclude (comma-separated)
    #[serde(default = "default_exclude_entities")]
    pub exclude_entities: String,

    /// Artifacts to generate
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<ArtifactKind>,

    /// Root directory generated paths are relative to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Target language of DTOs
    #[serde(default = "default_dto_target")]
    pub dto_target: Target,

    /// Target language of API clients
    #[serde(default = "default_client_target")]
    pub client_target: Target,

    /// Namespaces, directories and type names used in generated code
    #[serde(default)]
    pub naming: NamingConfig,

    /// Properties left out of Add/Update/Filter DTOs (case-insensitive)
    #[serde(default = "default_ignore_properties")]
    pub ignore_properties: Vec<String>,

    /// String properties with a max length at or above this are not filterable
    #[serde(default = "default_filter_max_length")]
    pub filter_max_length: u32,

    /// Directory with template overrides (`*.j2`, matched by file name)
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,

    /// Overwrite files that already exist
    #[serde(default = "default_force")]
    pub force: bool,

    /// Dry run mode - preview without writing files
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG env var
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Naming conventions of the generated project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Root namespace; falls back to each entity's own namespace
    pub root_namespace: Option<String>,
    pub dto_dir: PathBuf,
    pub dto_namespace: String,
    pub manager_dir: PathBuf,
    pub manager_namespace: String,
    pub controller_dir: PathBuf,
    pub controller_namespace: String,
    pub client_dir: PathBuf,
    pub client_namespace: String,
    pub filter_base_class: String,
    pub key_type: String,
    pub ts_types_import: String,
    pub rust_types_path: String,
}

// Default value functions for serde
fn default_include_entities() -> String {
    defaults::INCLUDE_ENTITIES.to_string()
}
fn default_exclude_entities() -> String {
    defaults::EXCLUDE_ENTITIES.to_string()
}
fn default_artifacts() -> Vec<ArtifactKind> {
    vec![ArtifactKind::Dto]
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(defaults::OUTPUT_DIR)
}
fn default_dto_target() -> Target {
    Target::CSharp
}
fn default_client_target() -> Target {
    Target::TypeScript
}
fn default_ignore_properties() -> Vec<String> {
    defaults::IGNORE_PROPERTIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_filter_max_length() -> u32 {
    defaults::FILTER_MAX_LENGTH
}
fn default_force() -> bool {
    defaults::FORCE
}
fn default_dry_run() -> bool {
    defaults::DRY_RUN
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            root_namespace: None,
            dto_dir: PathBuf::from(defaults::DTO_DIR),
            dto_namespace: defaults::DTO_NAMESPACE.to_string(),
            manager_dir: PathBuf::from(defaults::MANAGER_DIR),
            manager_namespace: defaults::MANAGER_NAMESPACE.to_string(),
            controller_dir: PathBuf::from(defaults::CONTROLLER_DIR),
            controller_namespace: defaults::CONTROLLER_NAMESPACE.to_string(),
            client_dir: PathBuf::from(defaults::CLIENT_DIR),
            client_namespace: defaults::CLIENT_NAMESPACE.to_string(),
            filter_base_class: defaults::FILTER_BASE_CLASS.to_string(),
            key_type: defaults::KEY_TYPE.to_string(),
            ts_types_import: defaults::TS_TYPES_IMPORT.to_string(),
            rust_types_path: defaults::RUST_TYPES_PATH.to_string(),
        }
    }
}

impl NamingConfig {
    /// Resolve the root namespace for an entity.
    ///
    /// Without a configured root and without a namespace on the entity no
    /// artifact can be named, so this is a configuration error.
    pub fn root_namespace_for(&self, entity: &EntityInfo) -> Result<String> {
        if let Some(root) = self.root_namespace.as_deref().map(str::trim) {
            if !root.is_empty() {
                return Ok(root.to_string());
            }
        }
        let own = entity.namespace_name.trim();
        if own.is_empty() {
            return Err(CodegenError::ConfigError(format!(
                "no namespace resolvable for entity `{}`: set naming.root_namespace",
                entity.name
            )));
        }
        Ok(own.to_string())
    }

    /// Root namespace for artifacts that are not tied to one entity
    pub fn root_namespace_or(&self, fallback: &str) -> Result<String> {
        match self.root_namespace.as_deref().map(str::trim) {
            Some(root) if !root.is_empty() => Ok(root.to_string()),
            _ if !fallback.trim().is_empty() => Ok(fallback.trim().to_string()),
            _ => Err(CodegenError::ConfigError(
                "no namespace resolvable: set naming.root_namespace".into(),
            )),
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            entity_paths: Vec::new(),
            include_entities: default_include_entities(),
            exclude_entities: default_exclude_entities(),
            artifacts: default_artifacts(),
            output_dir: default_output_dir(),
            dto_target: default_dto_target(),
            client_target: default_client_target(),
            naming: NamingConfig::default(),
            ignore_properties: default_ignore_properties(),
            filter_max_length: default_filter_max_length(),
            templates_dir: None,
            force: default_force(),
            dry_run: default_dry_run(),
            log_level: None,
        }
    }
}

impl CodegenConfig {
    /// Create a default config reading the given entity source
    pub fn default_with_entity(entity_path: PathBuf) -> Self {
        Self {
            entity_paths: vec![entity_path],
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CodegenConfig = toml::from_str(&content).map_err(|e| {
            CodegenError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from config file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        } else {
            // Try default locations
            builder = builder.add_source(File::with_name("crudforge").required(false));
        }

        // Override with environment variables (CRUDFORGE_OUTPUT_DIR, CRUDFORGE_NAMING__KEY_TYPE)
        builder = builder.add_source(
            Environment::with_prefix("CRUDFORGE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config: CodegenConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Whether a property is in the ignore set
    pub fn is_ignored(&self, property_name: &str) -> bool {
        self.ignore_properties
            .iter()
            .any(|p| p.eq_ignore_ascii_case(property_name))
    }

    /// Whether an artifact kind was requested
    pub fn wants(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains(&kind)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.entity_paths.is_empty() {
            return Err(CodegenError::ValidationError(
                "at least one entity path is required".into(),
            ));
        }

        for path in &self.entity_paths {
            if !path.exists() {
                return Err(CodegenError::ValidationError(format!(
                    "Entity source not found: {}",
                    path.display()
                )));
            }
        }

        if self.artifacts.is_empty() {
            return Err(CodegenError::ValidationError(
                "at least one artifact kind is required".into(),
            ));
        }

        if self.filter_max_length == 0 {
            return Err(CodegenError::ValidationError(
                "filter_max_length must be greater than zero".into(),
            ));
        }

        for kind in &self.artifacts {
            let target = match kind {
                ArtifactKind::Dto => self.dto_target,
                ArtifactKind::Client => self.client_target,
                ArtifactKind::Manager | ArtifactKind::Controller => Target::CSharp,
            };
            if !kind.supports(target) {
                return Err(CodegenError::UnsupportedTarget {
                    artifact: kind.label(),
                    target: target.to_string(),
                });
            }
        }

        Ok(())
    }
}
