//! Generation output unit

use serde::Serialize;
use std::path::{Path, PathBuf};

/// One generated file: produced by a generator, consumed by the emitter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenFileInfo {
    name: String,
    full_name: PathBuf,
    content: String,
}

impl GenFileInfo {
    pub fn new(name: impl Into<String>, full_name: impl Into<PathBuf>, content: String) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            content,
        }
    }

    /// File name, e.g. `BlogAddDto.cs`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target path, relative to the output root unless absolute
    pub fn full_name(&self) -> &Path {
        &self.full_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
