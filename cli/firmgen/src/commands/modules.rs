//! `firmgen modules`: catalog listing with selection status.

use anyhow::Result;
use firmgen_catalog::close;

use super::Project;

pub fn run(project: &Project) -> Result<()> {
    let catalog = project.catalog()?;
    let selection = close(&catalog, &project.selection()?).state;

    println!("Modules ({}):", catalog.len());
    println!();
    for module in catalog.modules() {
        let mark = if selection.is_enabled(&module.id) { "x" } else { " " };
        println!(
            "  [{mark}] {:<14} {:<11} {}",
            module.id,
            module.kind.as_str(),
            module.description
        );
        if !module.dependencies.is_empty() {
            println!("      requires: {}", module.dependencies.join(", "));
        }
        if let Some(entry) = selection.entry(&module.id).filter(|e| e.enabled) {
            if !entry.instances.is_empty() {
                println!("      instances: {}", entry.instances.join(", "));
            }
            for (key, value) in &entry.params {
                println!("      {key} = {value}");
            }
        }
    }
    println!();
    println!("Use 'firmgen enable <module>' to select a module.");
    Ok(())
}
