//! `firmgen plan`: show resource assignments without generating.

use anyhow::{Context, Result};
use firmgen_catalog::close;
use firmgen_generate::{available_instances, order_instances, AssignmentPlan, PlannerRegistry};

use super::Project;

pub fn run(project: &Project, format: Option<&str>) -> Result<()> {
    let catalog = project.catalog()?;
    let hardware = project.hardware()?;
    let selection = close(&catalog, &project.selection()?).state;
    let planners = PlannerRegistry::new();

    let mut plans: Vec<(String, Result<AssignmentPlan, String>)> = Vec::new();
    for module in selection.enabled_modules(&catalog) {
        let Some(req) = &module.peripheral else {
            continue;
        };
        let chosen = selection
            .entry(&module.id)
            .map(|e| e.instances.clone())
            .unwrap_or_default();
        let (ordered, stale) = order_instances(&chosen, &available_instances(&hardware, req));
        for s in &stale {
            log::warn!("{}: instance {s} is no longer in the hardware configuration", module.id);
        }
        let plan = planners.plan(&req.family, &ordered).map_err(|e| e.to_string());
        plans.push((module.id.clone(), plan));
    }

    match format {
        Some("json") => {
            let json: Vec<serde_json::Value> = plans
                .iter()
                .map(|(module, plan)| match plan {
                    Ok(p) => serde_json::json!({ "module": module, "plan": p }),
                    Err(e) => serde_json::json!({ "module": module, "error": e }),
                })
                .collect();
            let text = serde_json::to_string_pretty(&json).context("serializing plans")?;
            println!("{text}");
        }
        Some("text") | None => print_plans(&plans),
        Some(other) => anyhow::bail!("unknown format '{other}' (expected text or json)"),
    }
    Ok(())
}

fn print_plans(plans: &[(String, Result<AssignmentPlan, String>)]) {
    if plans.is_empty() {
        println!("No peripheral modules enabled.");
        return;
    }
    for (module, plan) in plans {
        let plan = match plan {
            Ok(p) => p,
            Err(e) => {
                println!("--- {module} ---");
                println!("  error: {e}");
                println!();
                continue;
            }
        };
        println!("--- {module} ({}, {}) ---", plan.family, plan.kind);
        for entry in &plan.entries {
            let configures = if entry.configures { "  [configures]" } else { "" };
            println!(
                "  {:<16} {:<14} slot {:<2} bank {:<2}{configures}",
                entry.instance, entry.handle, entry.slot, entry.bank
            );
        }
        let vectors = plan.vectors();
        if !vectors.is_empty() {
            println!("  vectors: {}", vectors.join(", "));
        }
        println!();
    }
}
