//! `firmgen.toml` manifest parsing and project paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Manifest file name, searched for from the working directory upward.
pub const MANIFEST_FILE: &str = "firmgen.toml";

/// The top-level manifest structure for a firmgen project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmgenManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, used in generated banners.
    pub name: String,
    /// Hardware configuration file, relative to the project root. When
    /// absent the single `.ioc` file in the project root is used.
    #[serde(default)]
    pub config: Option<String>,
}

/// Template directory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    #[serde(default = "default_templates")]
    pub path: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        TemplatesConfig {
            path: default_templates(),
        }
    }
}

fn default_templates() -> String {
    "templates".to_string()
}

/// Output directory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: default_output(),
        }
    }
}

fn default_output() -> String {
    ".".to_string()
}

impl FirmgenManifest {
    /// Search upward from `start_dir` for a `firmgen.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: FirmgenManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                log::debug!("Using manifest {}", candidate.display());
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing firmgen.toml")
    }

    /// Template directory, resolved against the project root.
    pub fn template_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.templates.path)
    }

    /// Output directory, resolved against the project root.
    pub fn output_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.output.dir)
    }

    /// Explicit hardware configuration file, resolved against the project root.
    pub fn config_path(&self, project_dir: &Path) -> Option<PathBuf> {
        self.project.config.as_ref().map(|c| project_dir.join(c))
    }

    /// Generate the default template for `firmgen init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[project]
name = "{name}"
# config = "{name}.ioc"

[templates]
path = "templates"

[output]
dir = "."
"#
        )
    }
}
