//! `firmgen init`: project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use firmgen_catalog::{SelectionState, SELECTION_FILE};

use crate::manifest::{FirmgenManifest, MANIFEST_FILE};

/// Create a new firmgen project.
///
/// `name` is the project name. The directory `name` is created relative to cwd.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("templates")).context("creating templates/ directory")?;

    fs::write(project_dir.join(MANIFEST_FILE), FirmgenManifest::template(name))
        .with_context(|| format!("writing {MANIFEST_FILE}"))?;

    SelectionState::new()
        .save(&project_dir.join(SELECTION_FILE))
        .with_context(|| format!("writing {SELECTION_FILE}"))?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/{SELECTION_FILE}");
    println!("  {name}/templates/");
    println!();
    println!("Copy the hardware configuration (.ioc) into {name}/ to get started.");

    Ok(())
}
