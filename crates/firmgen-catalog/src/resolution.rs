//! Dependency resolution over module selections.
//!
//! Enabling a module enables everything it transitively depends on.
//! Propagation is additive only: disabling a module never disables its
//! dependencies, and a module that an enabled module still depends on stays
//! enabled. Traversal follows catalog declaration order and declared
//! dependency order, so results are deterministic.

use crate::catalog::ModuleCatalog;
use crate::error::{CatalogError, Result};
use crate::selection::SelectionState;

/// A requested change to one module's enabled flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub module: String,
    pub enabled: bool,
}

impl Toggle {
    pub fn enable(module: impl Into<String>) -> Self {
        Toggle {
            module: module.into(),
            enabled: true,
        }
    }

    pub fn disable(module: impl Into<String>) -> Self {
        Toggle {
            module: module.into(),
            enabled: false,
        }
    }
}

/// The effective selection after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: SelectionState,
    /// Modules enabled because something depends on them, in traversal order.
    pub auto_enabled: Vec<String>,
    /// Modules a toggle tried to disable that stay enabled, with the
    /// enabled modules that require them.
    pub still_required: Vec<(String, Vec<String>)>,
}

/// Apply `toggles` to `current` and restore the dependency closure.
pub fn resolve(
    catalog: &ModuleCatalog,
    current: &SelectionState,
    toggles: &[Toggle],
) -> Result<Resolution> {
    for toggle in toggles {
        if !catalog.contains(&toggle.module) {
            return Err(CatalogError::UnknownModule {
                id: toggle.module.clone(),
            });
        }
    }

    let mut state = current.clone();
    for toggle in toggles {
        state.entry_mut(&toggle.module).enabled = toggle.enabled;
    }

    let mut resolution = close(catalog, &state);

    for toggle in toggles.iter().filter(|t| !t.enabled) {
        if !resolution.state.is_enabled(&toggle.module) {
            continue;
        }
        let requirers: Vec<String> = catalog
            .dependents(&toggle.module)
            .into_iter()
            .filter(|m| resolution.state.is_enabled(&m.id))
            .map(|m| m.id.clone())
            .collect();
        log::warn!(
            "'{}' stays enabled: required by {}",
            toggle.module,
            requirers.join(", ")
        );
        resolution.auto_enabled.retain(|id| id != &toggle.module);
        resolution
            .still_required
            .push((toggle.module.clone(), requirers));
    }

    Ok(resolution)
}

/// Enable every dependency of every enabled module.
///
/// Idempotent: closing an already-closed state changes nothing.
pub fn close(catalog: &ModuleCatalog, state: &SelectionState) -> Resolution {
    let mut state = state.clone();
    let mut auto_enabled = Vec::new();

    for module in catalog.modules() {
        if state.is_enabled(&module.id) {
            enable_dependencies(catalog, &mut state, &module.id, &mut auto_enabled);
        }
    }

    for id in state.unknown_modules(catalog) {
        log::warn!("selection names unknown module '{id}'; ignoring");
    }

    Resolution {
        state,
        auto_enabled,
        still_required: Vec::new(),
    }
}

fn enable_dependencies(
    catalog: &ModuleCatalog,
    state: &mut SelectionState,
    id: &str,
    auto_enabled: &mut Vec<String>,
) {
    let Some(module) = catalog.get(id) else {
        return;
    };
    for dep in &module.dependencies {
        if !state.is_enabled(dep) {
            state.entry_mut(dep).enabled = true;
            log::debug!("enabling '{dep}' (required by '{id}')");
            auto_enabled.push(dep.clone());
            enable_dependencies(catalog, state, dep, auto_enabled);
        }
    }
}
