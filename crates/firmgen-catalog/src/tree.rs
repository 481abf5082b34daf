//! ASCII dependency-tree display of enabled modules.

use std::collections::HashSet;

use crate::catalog::ModuleCatalog;
use crate::selection::SelectionState;

/// Format the enabled modules as a dependency tree.
///
/// Roots are enabled modules no other enabled module depends on, in
/// catalog order. A module reached a second time is printed once more with
/// a `(shared)` marker and not expanded again.
pub fn format_tree(project: &str, catalog: &ModuleCatalog, state: &SelectionState) -> String {
    let mut out = format!("{project}\n");

    let enabled = state.enabled_modules(catalog);
    let roots: Vec<&str> = enabled
        .iter()
        .filter(|m| {
            !catalog
                .dependents(&m.id)
                .iter()
                .any(|d| state.is_enabled(&d.id))
        })
        .map(|m| m.id.as_str())
        .collect();

    let mut seen = HashSet::new();
    let count = roots.len();
    for (i, id) in roots.iter().enumerate() {
        format_module(&mut out, catalog, id, "", i == count - 1, &mut seen);
    }

    out.push_str(&format!(
        "\n{} modules enabled ({} roots)\n",
        enabled.len(),
        roots.len()
    ));
    out
}

fn format_module(
    out: &mut String,
    catalog: &ModuleCatalog,
    id: &str,
    prefix: &str,
    is_last: bool,
    seen: &mut HashSet<String>,
) {
    let connector = if is_last { "└── " } else { "├── " };
    let first_visit = seen.insert(id.to_string());
    let shared_marker = if first_visit { "" } else { " (shared)" };
    let kind = catalog
        .get(id)
        .map(|m| format!(" [{}]", m.kind))
        .unwrap_or_default();

    out.push_str(&format!("{prefix}{connector}{id}{kind}{shared_marker}\n"));
    if !first_visit {
        return;
    }

    let Some(module) = catalog.get(id) else {
        return;
    };
    let child_prefix = if is_last {
        format!("{prefix}    ")
    } else {
        format!("{prefix}│   ")
    };
    let child_count = module.dependencies.len();
    for (i, dep) in module.dependencies.iter().enumerate() {
        format_module(out, catalog, dep, &child_prefix, i == child_count - 1, seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{resolve, Toggle};

    fn state_with(ids: &[&str]) -> SelectionState {
        let catalog = ModuleCatalog::builtin();
        let toggles: Vec<Toggle> = ids.iter().map(|id| Toggle::enable(*id)).collect();
        resolve(&catalog, &SelectionState::new(), &toggles).unwrap().state
    }

    #[test]
    fn empty_selection() {
        let catalog = ModuleCatalog::builtin();
        let output = format_tree("board", &catalog, &SelectionState::new());
        assert_eq!(output, "board\n\n0 modules enabled (0 roots)\n");
    }

    #[test]
    fn nested_tree() {
        let catalog = ModuleCatalog::builtin();
        let output = format_tree("board", &catalog, &state_with(&["shell"]));
        let expected = "\
board
└── shell [component]
    └── log [component]
        ├── ringbuf [component]
        └── uart [peripheral]

4 modules enabled (1 roots)
";
        assert_eq!(output, expected);
    }

    #[test]
    fn shared_dependency_marker() {
        let catalog = ModuleCatalog::builtin();
        let output = format_tree("board", &catalog, &state_with(&["log", "can_motor"]));
        assert!(output.contains("├── log [component]"));
        assert!(output.contains("└── can_motor [device]"));
        assert!(output.contains("    └── ringbuf [component] (shared)"));
        assert!(output.contains("2 roots"));
    }
}
