//! Code generation module

mod client_generator;
mod code_generator;
mod controller_generator;
mod dto_generator;
mod manager_generator;
mod naming;
mod template;

pub use client_generator::*;
pub use code_generator::*;
pub use controller_generator::*;
pub use dto_generator::*;
pub use manager_generator::*;
pub use naming::*;
pub use template::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::projection::Target;

/// Kinds of artifacts the generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Dto,
    Manager,
    Controller,
    Client,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Dto,
        ArtifactKind::Manager,
        ArtifactKind::Controller,
        ArtifactKind::Client,
    ];

    /// Whether this artifact can be rendered in the given language
    pub fn supports(self, target: Target) -> bool {
        match self {
            ArtifactKind::Dto => true,
            ArtifactKind::Manager | ArtifactKind::Controller => target == Target::CSharp,
            ArtifactKind::Client => matches!(target, Target::CSharp | Target::TypeScript),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Dto => "dto",
            ArtifactKind::Manager => "manager",
            ArtifactKind::Controller => "controller",
            ArtifactKind::Client => "client",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown artifact kind `{}`", s))
    }
}

/// Pretty-print generated Rust source.
///
/// Text that does not parse is returned unchanged so the failure shows up
/// where the generated file is compiled.
pub(crate) fn format_rust(source: String) -> String {
    match syn::parse_file(&source) {
        Ok(file) => prettyplease::unparse(&file),
        Err(err) => {
            warn!("Generated Rust did not parse, emitting unformatted: {}", err);
            source
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_support_matrix() {
        for target in [Target::CSharp, Target::TypeScript, Target::Rust] {
            assert!(ArtifactKind::Dto.supports(target));
        }
        assert!(ArtifactKind::Manager.supports(Target::CSharp));
        assert!(!ArtifactKind::Manager.supports(Target::TypeScript));
        assert!(!ArtifactKind::Controller.supports(Target::Rust));
        assert!(ArtifactKind::Client.supports(Target::TypeScript));
        assert!(!ArtifactKind::Client.supports(Target::Rust));
    }

    #[test]
    fn test_artifact_parsing() {
        assert_eq!("DTO".parse::<ArtifactKind>().unwrap(), ArtifactKind::Dto);
        assert_eq!(" client".parse::<ArtifactKind>().unwrap(), ArtifactKind::Client);
        assert!("view".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_format_rust_falls_back() {
        let formatted = format_rust("pub struct A{pub b:i32}".to_string());
        assert!(formatted.contains("pub struct A {"));
        let broken = "pub struct {".to_string();
        assert_eq!(format_rust(broken.clone()), broken);
    }
}
