//! Main code generator orchestrator

use tracing::debug;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::model::{ApiDocument, EntityInfo, GenFileInfo};

use super::client_generator::ClientGenerator;
use super::controller_generator::ControllerGenerator;
use super::dto_generator::DtoGenerator;
use super::manager_generator::ManagerGenerator;
use super::template::TemplateSet;
use super::ArtifactKind;

/// Runs every configured artifact generator over entities and documents
pub struct CodeGenerator<'a> {
    config: &'a CodegenConfig,
    templates: TemplateSet,
}

impl<'a> CodeGenerator<'a> {
    /// Create a generator, loading template overrides from `templates_dir`
    pub fn new(config: &'a CodegenConfig) -> Result<Self> {
        let templates = TemplateSet::load(config.templates_dir.as_deref())?;
        Ok(Self { config, templates })
    }

    /// Create a generator over an already loaded template set
    pub fn with_templates(config: &'a CodegenConfig, templates: TemplateSet) -> Self {
        Self { config, templates }
    }

    /// Generate the per-entity artifacts (DTOs, manager, controller)
    pub fn generate_entity(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        let mut files = Vec::new();
        for kind in self.kinds() {
            match kind {
                ArtifactKind::Dto => files.extend(self.generate_dtos(entity)?),
                ArtifactKind::Manager => files.extend(self.generate_manager(entity)?),
                ArtifactKind::Controller => files.extend(self.generate_controller(entity)?),
                ArtifactKind::Client => {
                    debug!("Client artifacts come from documents, skipping {}", entity.name)
                }
            }
        }
        Ok(files)
    }

    /// Generate the per-document artifacts (tag controllers, API client)
    pub fn generate_document(&self, document: &ApiDocument) -> Result<Vec<GenFileInfo>> {
        let mut files = Vec::new();
        for kind in self.kinds() {
            match kind {
                ArtifactKind::Controller => files.extend(
                    ControllerGenerator::new(self.config, &self.templates)
                        .generate_document(document)?,
                ),
                ArtifactKind::Client => files.extend(
                    ClientGenerator::new(self.config, &self.templates)
                        .with_target(self.config.client_target)
                        .generate(document)?,
                ),
                ArtifactKind::Dto | ArtifactKind::Manager => {}
            }
        }
        Ok(files)
    }

    pub fn generate_dtos(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        DtoGenerator::new(self.config, &self.templates)
            .with_target(self.config.dto_target)
            .generate(entity)
    }

    pub fn generate_manager(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        ManagerGenerator::new(self.config, &self.templates).generate(entity)
    }

    pub fn generate_controller(&self, entity: &EntityInfo) -> Result<Vec<GenFileInfo>> {
        ControllerGenerator::new(self.config, &self.templates).generate(entity)
    }

    /// Configured kinds, deduplicated, in a fixed order
    fn kinds(&self) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|k| self.config.wants(*k))
            .collect()
    }
}
