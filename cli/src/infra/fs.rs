//! Filesystem infrastructure: implements `TemplateFs` over the local disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::application::ports::TemplateFs;
use crate::domain::store::is_template_file;

/// Production filesystem implementation of `TemplateFs`.
pub struct LocalTemplateFs;

impl TemplateFs for LocalTemplateFs {
    fn read_template(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write_staged(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(path, contents).with_context(|| format!("writing file {}", path.display()))
    }

    fn list_templates(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "template directory missing");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
            if entry.file_type().is_file() && is_template_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
