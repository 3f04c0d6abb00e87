//! Workflow specification loader
//!
//! The compiler consumes an already-parsed specification. This loader reads
//! it from disk (YAML or JSON, chosen by extension, YAML otherwise) and
//! records where it came from so the driver can locate the repository root.

use crate::WorkflowSpec;
use awc_core::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Input document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
}

impl SpecFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SpecFormat::Json,
            _ => SpecFormat::Yaml,
        }
    }
}

/// A specification together with its source location
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub path: PathBuf,
    pub spec: WorkflowSpec,
}

/// Loads workflow specifications from files or strings
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    format: Option<SpecFormat>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a format instead of inferring it from the extension
    pub fn format(mut self, format: SpecFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Load a specification from `path`
    pub fn load(&self, path: &Path) -> Result<LoadedSpec> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read", e))?;
        let format = self.format.unwrap_or_else(|| SpecFormat::from_path(path));
        debug!(path = %path.display(), ?format, "loading workflow specification");

        let spec = parse_spec(&content, format)
            .with_context(|| format!("invalid workflow specification '{}'", path.display()))?;

        Ok(LoadedSpec {
            path: path.to_path_buf(),
            spec,
        })
    }

    /// Load several specifications, failing on the first bad one
    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<LoadedSpec>> {
        paths.iter().map(|path| self.load(path)).collect()
    }
}

/// Parse a specification document
pub fn parse_spec(content: &str, format: SpecFormat) -> Result<WorkflowSpec> {
    match format {
        SpecFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        SpecFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

/// Walk upwards from `start` to the nearest directory containing `.git` or
/// `.github`. Falls back to `start` itself.
pub fn find_repo_root(start: &Path) -> PathBuf {
    let start = if start.is_file() {
        start.parent().unwrap_or(start)
    } else {
        start
    };

    start
        .ancestors()
        .find(|dir| dir.join(".git").exists() || dir.join(".github").is_dir())
        .unwrap_or(start)
        .to_path_buf()
}
