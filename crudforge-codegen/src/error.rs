//! Error types for crudforge-codegen

use serde::Serialize;
use thiserror::Error;

/// Result type alias for crudforge-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to parse {0}")]
    Parse(#[from] ParseFailure),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Target {target} is not supported by the {artifact} generator")]
    UnsupportedTarget {
        artifact: &'static str,
        target: String,
    },

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Malformed or unsupported input for a single entity or document.
///
/// Local to one input: a batch keeps going and reports these alongside the
/// files it did produce.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{path}: {reason}")]
pub struct ParseFailure {
    /// File path or JSON pointer of the offending input
    pub path: String,
    pub reason: String,
}

impl ParseFailure {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}

impl From<minijinja::Error> for CodegenError {
    fn from(err: minijinja::Error) -> Self {
        CodegenError::TemplateError(err.to_string())
    }
}

impl From<serde_json::Error> for CodegenError {
    fn from(err: serde_json::Error) -> Self {
        CodegenError::ConfigError(format!("invalid JSON: {}", err))
    }
}

impl From<toml::de::Error> for CodegenError {
    fn from(err: toml::de::Error) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}
