//! `firmgen tree`: dependency tree of the effective selection.

use anyhow::Result;
use firmgen_catalog::{close, format_tree};

use super::Project;

pub fn run(project: &Project) -> Result<()> {
    let catalog = project.catalog()?;
    let selection = close(&catalog, &project.selection()?).state;
    print!("{}", format_tree(project.name(), &catalog, &selection));
    Ok(())
}
