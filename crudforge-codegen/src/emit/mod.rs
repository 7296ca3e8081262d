//! Emission: write generated files under an output root

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::GenFileInfo;

/// A file written (or, in a dry run, that would be written)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
}

/// A file left alone because it already exists and `force` is off
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
}

/// A file that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one emission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitReport {
    pub written: Vec<WrittenFile>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
}

impl EmitReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }

    pub fn merge(&mut self, other: EmitReport) {
        self.written.extend(other.written);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

/// Write `files` under `root`.
///
/// A missing file is written, an existing one is overwritten only with
/// `force` and otherwise reported as skipped. A file that cannot be written
/// is reported as failed and the remaining files are still written; only an
/// output root that cannot be created is an error.
pub fn emit(files: &[GenFileInfo], root: &Path, force: bool) -> Result<EmitReport> {
    fs::create_dir_all(root)?;
    let mut report = EmitReport::default();
    for file in files {
        let path = root.join(file.full_name());
        if path.exists() && !force {
            warn!("{} exists, skipping (use --force to overwrite)", path.display());
            report.skipped.push(SkippedFile { path });
            continue;
        }
        match write_file(&path, file.content()) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                report.written.push(WrittenFile { path });
            }
            Err(err) => {
                warn!("Failed to write {}: {}", path.display(), err);
                report.failed.push(FailedFile {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        "Emitted {} files ({} skipped, {} failed) under {}",
        report.written.len(),
        report.skipped.len(),
        report.failed.len(),
        root.display()
    );
    Ok(report)
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// What [`emit`] would do, without touching the disk
pub fn plan(files: &[GenFileInfo], root: &Path, force: bool) -> EmitReport {
    let mut report = EmitReport::default();
    for file in files {
        let path = root.join(file.full_name());
        if path.exists() && !force {
            report.skipped.push(SkippedFile { path });
        } else {
            report.written.push(WrittenFile { path });
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn files() -> Vec<GenFileInfo> {
        vec![
            GenFileInfo::new("BlogAddDto.cs", "Share/Models/BlogDtos/BlogAddDto.cs", "class A {}\n".to_string()),
            GenFileInfo::new("BlogManager.cs", "Application/Managers/BlogManager.cs", "class B {}\n".to_string()),
        ]
    }

    #[test]
    fn test_emit_creates_directories() {
        let dir = TempDir::new().unwrap();
        let report = emit(&files(), dir.path(), false).unwrap();
        assert_eq!(report.written.len(), 2);
        assert!(report.skipped.is_empty());
        let written = fs::read_to_string(dir.path().join("Share/Models/BlogDtos/BlogAddDto.cs")).unwrap();
        assert_eq!(written, "class A {}\n");
    }

    #[test]
    fn test_existing_files_skip_unless_forced() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Application/Managers/BlogManager.cs");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "hand edited").unwrap();

        let report = emit(&files(), dir.path(), false).unwrap();
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.skipped, vec![SkippedFile { path: target.clone() }]);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hand edited");

        let report = emit(&files(), dir.path(), true).unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read_to_string(&target).unwrap(), "class B {}\n");
    }

    #[test]
    fn test_write_failure_is_itemized() {
        let dir = TempDir::new().unwrap();
        // A plain file where the DTO directory should go
        fs::write(dir.path().join("Share"), "not a directory").unwrap();

        let report = emit(&files(), dir.path(), false).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            report.failed[0].path,
            dir.path().join("Share/Models/BlogDtos/BlogAddDto.cs")
        );
        assert_eq!(
            report.written,
            vec![WrittenFile {
                path: dir.path().join("Application/Managers/BlogManager.cs")
            }]
        );
    }

    #[test]
    fn test_plan_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let report = plan(&files(), dir.path(), false);
        assert_eq!(report.written.len(), 2);
        assert!(!dir.path().join("Share").exists());
    }
}
