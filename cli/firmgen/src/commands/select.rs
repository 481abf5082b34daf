//! Selection commands: `enable`, `disable`, `set`, `instances`.
//!
//! Every change goes through the dependency resolver and is written back to
//! the selection record only when it succeeds.

use anyhow::{bail, Context, Result};
use firmgen_catalog::{param_value, resolve, ModuleCatalog, Resolution, SelectionState, Toggle};
use firmgen_config::HardwareConfig;
use firmgen_generate::available_instances;

use super::Project;

/// Run `firmgen enable <module>...`.
///
/// Peripheral modules enabled here (directly or as dependencies) with no
/// instances chosen yet get every available instance.
pub fn enable(project: &Project, modules: &[String]) -> Result<Resolution> {
    let catalog = project.catalog()?;
    let current = project.selection()?;
    let toggles: Vec<Toggle> = modules.iter().map(Toggle::enable).collect();
    let mut resolution = resolve(&catalog, &current, &toggles)?;

    let hardware = match project.hardware() {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("instances not filled in: {e:#}");
            None
        }
    };
    if let Some(hardware) = &hardware {
        fill_instances(&catalog, hardware, &current, &mut resolution.state);
    }

    project.save_selection(&resolution.state)?;

    for id in modules {
        println!("Enabled {id}");
    }
    if !resolution.auto_enabled.is_empty() {
        println!("Also enabled (dependencies): {}", resolution.auto_enabled.join(", "));
    }
    Ok(resolution)
}

/// Run `firmgen disable <module>...`.
pub fn disable(project: &Project, modules: &[String]) -> Result<Resolution> {
    let catalog = project.catalog()?;
    let current = project.selection()?;
    let toggles: Vec<Toggle> = modules.iter().map(Toggle::disable).collect();
    let resolution = resolve(&catalog, &current, &toggles)?;

    project.save_selection(&resolution.state)?;

    for id in modules {
        match resolution.still_required.iter().find(|(m, _)| m == id) {
            Some((_, by)) => println!("Kept {id}: required by {}", by.join(", ")),
            None => println!("Disabled {id}"),
        }
    }
    Ok(resolution)
}

/// Run `firmgen set <module> <key> <value>`.
pub fn set(project: &Project, module: &str, key: &str, value: &str) -> Result<()> {
    let catalog = project.catalog()?;
    if !catalog.contains(module) {
        bail!("unknown module '{module}'. Use 'firmgen modules' to list modules.");
    }
    let mut selection = project.selection()?;
    let value = param_value(value);
    println!("{module}.{key} = {value}");
    selection.set_param(module, key, value);
    project.save_selection(&selection)
}

/// Run `firmgen instances <module> [<instance>...]`.
///
/// Without instances, prints the current choice and what is available.
pub fn instances(project: &Project, module: &str, chosen: &[String]) -> Result<()> {
    let catalog = project.catalog()?;
    let Some(descriptor) = catalog.get(module) else {
        bail!("unknown module '{module}'. Use 'firmgen modules' to list modules.");
    };
    let Some(req) = &descriptor.peripheral else {
        bail!("module '{module}' does not bind hardware instances");
    };
    let hardware = project.hardware()?;
    let available = available_instances(&hardware, req);
    let mut selection = project.selection()?;

    if chosen.is_empty() {
        let current = selection
            .entry(module)
            .map(|e| e.instances.join(", "))
            .unwrap_or_default();
        println!("{module} ({}):", req.family);
        println!("  chosen:    {}", if current.is_empty() { "(none)" } else { current.as_str() });
        println!("  available: {}", available.join(", "));
        return Ok(());
    }

    let mut picked: Vec<String> = Vec::new();
    for name in chosen {
        let Some(found) = available.iter().find(|a| a.eq_ignore_ascii_case(name)) else {
            bail!(
                "'{name}' is not an available {} instance (available: {})",
                req.family,
                available.join(", ")
            );
        };
        if !picked.contains(found) {
            picked.push(found.clone());
        }
    }

    println!("{module} instances: {}", picked.join(", "));
    selection.set_instances(module, picked);
    project
        .save_selection(&selection)
        .with_context(|| format!("saving instances of '{module}'"))
}

/// Give newly enabled peripheral modules every available instance.
fn fill_instances(
    catalog: &ModuleCatalog,
    hardware: &HardwareConfig,
    before: &SelectionState,
    after: &mut SelectionState,
) {
    for module in catalog.modules() {
        let Some(req) = &module.peripheral else {
            continue;
        };
        if before.is_enabled(&module.id) || !after.is_enabled(&module.id) {
            continue;
        }
        let entry = after.entry_mut(&module.id);
        if entry.instances.is_empty() {
            entry.instances = available_instances(hardware, req);
            log::debug!("{}: chose {}", module.id, entry.instances.join(", "));
        }
    }
}
