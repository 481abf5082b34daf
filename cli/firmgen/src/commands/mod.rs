//! CLI command implementations.

pub mod generate;
pub mod info;
pub mod init;
pub mod modules;
pub mod plan;
pub mod select;
pub mod tree;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use firmgen_catalog::{ModuleCatalog, SelectionState, SELECTION_FILE};
use firmgen_config::{discover_config, load_config, HardwareConfig};

use crate::manifest::FirmgenManifest;

/// Command-line overrides of manifest paths, relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub templates: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// A loaded project: manifest plus resolved paths.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub manifest: FirmgenManifest,
    pub template_root: PathBuf,
    pub output_root: PathBuf,
    config_path: Option<PathBuf>,
}

impl Project {
    pub fn new(dir: PathBuf, manifest: FirmgenManifest, cwd: &Path, overrides: &Overrides) -> Self {
        let template_root = match &overrides.templates {
            Some(p) => cwd.join(p),
            None => manifest.template_root(&dir),
        };
        let output_root = match &overrides.output {
            Some(p) => cwd.join(p),
            None => manifest.output_root(&dir),
        };
        let config_path = match &overrides.config {
            Some(p) => Some(cwd.join(p)),
            None => manifest.config_path(&dir),
        };
        Project {
            dir,
            manifest,
            template_root,
            output_root,
            config_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.project.name
    }

    /// The template directory's `catalog.toml`, or the built-in catalog.
    pub fn catalog(&self) -> Result<ModuleCatalog> {
        ModuleCatalog::for_template_root(&self.template_root).with_context(|| {
            format!("loading module catalog from {}", self.template_root.display())
        })
    }

    /// Path of the hardware configuration file in use.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(discover_config(&self.dir)?.path),
        }
    }

    pub fn hardware(&self) -> Result<HardwareConfig> {
        let path = self.config_path()?;
        load_config(&path).with_context(|| format!("loading {}", path.display()))
    }

    pub fn selection_path(&self) -> PathBuf {
        self.dir.join(SELECTION_FILE)
    }

    pub fn selection(&self) -> Result<SelectionState> {
        let path = self.selection_path();
        SelectionState::load(&path).with_context(|| format!("loading {}", path.display()))
    }

    pub fn save_selection(&self, selection: &SelectionState) -> Result<()> {
        let path = self.selection_path();
        selection
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))
    }
}
