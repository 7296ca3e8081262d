//! Template loading and rendering

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Built-in templates, addressed by file name
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("dto.cs.j2", include_str!("../../templates/dto.cs.j2")),
    ("dto.ts.j2", include_str!("../../templates/dto.ts.j2")),
    ("dto.rs.j2", include_str!("../../templates/dto.rs.j2")),
    ("dto_mod.rs.j2", include_str!("../../templates/dto_mod.rs.j2")),
    ("manager.cs.j2", include_str!("../../templates/manager.cs.j2")),
    ("controller.cs.j2", include_str!("../../templates/controller.cs.j2")),
    (
        "api_controller.cs.j2",
        include_str!("../../templates/api_controller.cs.j2"),
    ),
    (
        "client_service.ts.j2",
        include_str!("../../templates/client_service.ts.j2"),
    ),
    (
        "client_model.ts.j2",
        include_str!("../../templates/client_model.ts.j2"),
    ),
    (
        "client_index.ts.j2",
        include_str!("../../templates/client_index.ts.j2"),
    ),
    (
        "client_service.cs.j2",
        include_str!("../../templates/client_service.cs.j2"),
    ),
    (
        "client_model.cs.j2",
        include_str!("../../templates/client_model.cs.j2"),
    ),
];

/// The set of templates used by the generators
pub struct TemplateSet {
    env: Environment<'static>,
}

impl TemplateSet {
    /// Only the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        for &(name, source) in BUILTIN_TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Built-in templates, replaced by same-named files from `dir` when present
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut set = Self::builtin()?;
        let Some(dir) = dir else {
            return Ok(set);
        };

        for &(name, _) in BUILTIN_TEMPLATES {
            let path = dir.join(name);
            if path.is_file() {
                debug!("Template override: {}", path.display());
                let source = fs::read_to_string(&path)?;
                set.env.add_template_owned(name.to_string(), source)?;
            }
        }
        Ok(set)
    }

    /// Render a template and tidy the result
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        let text = template.render(ctx)?;
        Ok(tidy(&text))
    }
}

/// Collapse runs of blank lines, drop trailing whitespace, end with one newline
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if blank_run {
                continue;
            }
            blank_run = true;
        } else {
            blank_run = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tidy() {
        assert_eq!(tidy("\n\na\n\n\n\nb  \n\n"), "a\n\nb\n");
        assert_eq!(tidy("a"), "a\n");
    }

    #[test]
    fn test_builtins_compile() {
        let set = TemplateSet::builtin().unwrap();
        for &(name, _) in BUILTIN_TEMPLATES {
            assert!(set.env.get_template(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_override_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dto.ts.j2"), "// {{ type_name }}\n\n\n").unwrap();

        let set = TemplateSet::load(Some(dir.path())).unwrap();
        let text = set.render("dto.ts.j2", json!({ "type_name": "BlogAddDto" })).unwrap();
        assert_eq!(text, "// BlogAddDto\n");
    }

    #[test]
    fn test_unknown_template_is_error() {
        let set = TemplateSet::builtin().unwrap();
        assert!(set.render("missing.j2", json!({})).is_err());
    }
}
