//! Generation pipeline orchestrator.
//!
//! ```text
//! Init -> Planning -> Rendering -> Merging -> Persisting -> Done
//!   \________\___________\___________\___________\-> Aborted(reason)
//! ```
//! Fatal problems (unreadable template directory, any catalog module
//! referencing a missing template) abort during `Init`, before any file is
//! touched.
//! Everything else is recorded against the affected targets and the run
//! goes on.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use firmgen_catalog::{
    close, InstanceSource, ModuleCatalog, ModuleDescriptor, PeripheralRequirement, SelectionState,
};
use firmgen_config::HardwareConfig;
use firmgen_render::{merge_with_report, TemplateStore};

use crate::bindings::{module_bindings, BindingContext};
use crate::error::Result;
use crate::plan::{order_instances, AssignmentPlan, PlannerRegistry};
use crate::report::{GenerationReport, GenerationResult, Outcome};
use crate::sink::{FileEvent, ProgressSink};
use crate::writer::{write_atomic, WriteStatus};

/// Pipeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Init,
    Planning,
    Rendering,
    Merging,
    Persisting,
    Done,
    Aborted(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Planning => f.write_str("planning"),
            Self::Rendering => f.write_str("rendering"),
            Self::Merging => f.write_str("merging"),
            Self::Persisting => f.write_str("persisting"),
            Self::Done => f.write_str("done"),
            Self::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Shared flag asking a running pipeline to stop between modules.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one run needs; no global state is consulted.
pub struct PipelineConfig {
    /// Project name used in banners and the report.
    pub project: String,
    /// Root that relative output paths are joined to.
    pub output_root: PathBuf,
    /// Materialized template directory.
    pub template_root: PathBuf,
    pub catalog: ModuleCatalog,
    pub hardware: HardwareConfig,
    pub selection: SelectionState,
    /// Where to write the selection back after a completed run.
    pub selection_path: Option<PathBuf>,
    pub planners: PlannerRegistry,
    /// Compute everything, write nothing.
    pub dry_run: bool,
    pub cancel: CancellationToken,
}

impl PipelineConfig {
    /// A configuration with the default planners, no persistence, not dry-run.
    pub fn new(
        project: &str,
        output_root: &Path,
        template_root: &Path,
        catalog: ModuleCatalog,
        hardware: HardwareConfig,
        selection: SelectionState,
    ) -> Self {
        PipelineConfig {
            project: project.to_string(),
            output_root: output_root.to_path_buf(),
            template_root: template_root.to_path_buf(),
            catalog,
            hardware,
            selection,
            selection_path: None,
            planners: PlannerRegistry::new(),
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Hardware instances a peripheral module can choose from, in config order.
pub fn available_instances(
    config: &HardwareConfig,
    requirement: &PeripheralRequirement,
) -> Vec<String> {
    match requirement.source {
        InstanceSource::Declared => config.enabled_instances(&requirement.family),
        InstanceSource::Pins => config
            .gpio_candidates(false)
            .into_iter()
            .map(|p| p.pin)
            .collect(),
        InstanceSource::InterruptPins => config
            .gpio_candidates(true)
            .into_iter()
            .map(|p| p.pin)
            .collect(),
        InstanceSource::PwmChannels => config.pwm_channels().iter().map(|c| c.instance()).collect(),
    }
}

/// One output file of an enabled module, carried through the stages.
struct Target {
    template: String,
    output: String,
    path: PathBuf,
    text: std::result::Result<String, String>,
    preserved: Vec<String>,
    dropped: Vec<String>,
}

/// A module's targets; `None` when the module is not selected.
struct ModuleWork<'c> {
    module: &'c ModuleDescriptor,
    targets: Option<Vec<Target>>,
}

/// Run the pipeline.
pub fn generate(config: PipelineConfig, sink: &mut dyn ProgressSink) -> Result<GenerationReport> {
    let start = Instant::now();
    sink.stage(&Stage::Init);

    let mut report =
        GenerationReport::new(&config.project, config.hardware.mcu_name(), config.dry_run);
    let (selection, mut store) = match init(&config, &mut report) {
        Ok(ready) => ready,
        Err(e) => {
            sink.stage(&Stage::Aborted(e.to_string()));
            return Err(e);
        }
    };

    sink.stage(&Stage::Planning);
    let plans = plan_modules(&config, &selection, &mut report);

    sink.stage(&Stage::Rendering);
    let ctx = BindingContext {
        project: &config.project,
        catalog: &config.catalog,
        config: &config.hardware,
    };
    let mut work: Vec<ModuleWork<'_>> = Vec::new();
    for module in config.catalog.modules() {
        if config.cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        if !selection.is_enabled(&module.id) {
            work.push(ModuleWork {
                module,
                targets: None,
            });
            continue;
        }
        let entry = selection.entry(&module.id);
        let bindings = match plans.get(module.id.as_str()) {
            Some(Err(reason)) => Err(reason.clone()),
            Some(Ok(plan)) => Ok(module_bindings(&ctx, module, entry, Some(plan))),
            None => Ok(module_bindings(&ctx, module, entry, None)),
        };
        let targets = module
            .templates
            .iter()
            .map(|t| Target {
                template: t.template.clone(),
                output: t.output.clone(),
                path: config.output_root.join(&t.output),
                text: match &bindings {
                    Ok(b) => store.render(&t.template, b).map_err(|e| e.to_string()),
                    Err(reason) => Err(reason.clone()),
                },
                preserved: Vec::new(),
                dropped: Vec::new(),
            })
            .collect();
        work.push(ModuleWork {
            module,
            targets: Some(targets),
        });
    }

    sink.stage(&Stage::Merging);
    for t in work.iter_mut().filter_map(|w| w.targets.as_mut()).flatten() {
        merge_target(t);
        if !t.dropped.is_empty() {
            log::warn!(
                "{}: user regions no longer in {}: {}",
                t.output,
                t.template,
                t.dropped.join(", ")
            );
        }
    }

    sink.stage(&Stage::Persisting);
    for w in work {
        if config.cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        let id = &w.module.id;
        let results: Vec<(PathBuf, GenerationResult)> = match w.targets {
            Some(targets) => targets
                .into_iter()
                .map(|t| {
                    let outcome = persist_target(&t, config.dry_run);
                    let mut result = GenerationResult::new(id, &t.output, outcome);
                    result.preserved_regions = t.preserved;
                    result.dropped_regions = t.dropped;
                    (t.path, result)
                })
                .collect(),
            None => w
                .module
                .templates
                .iter()
                .map(|t| {
                    let path = config.output_root.join(&t.output);
                    let outcome = if path.exists() {
                        Outcome::SkippedPresent
                    } else {
                        Outcome::NotNeeded
                    };
                    (path, GenerationResult::new(id, &t.output, outcome))
                })
                .collect(),
        };
        for (path, result) in results {
            sink.file(&FileEvent {
                module: id.clone(),
                path,
                outcome: result.outcome.clone(),
            });
            report.results.push(result);
        }
    }

    if !report.cancelled && !config.dry_run {
        if let Some(path) = &config.selection_path {
            match selection.save(path) {
                Ok(()) => report.selection_saved = true,
                Err(e) => report.warnings.push(format!("selection not saved: {e}")),
            }
        }
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    sink.stage(&Stage::Done);
    sink.finished(&report);
    Ok(report)
}

/// Fatal checks; nothing has been written when this fails.
fn init(
    config: &PipelineConfig,
    report: &mut GenerationReport,
) -> Result<(SelectionState, TemplateStore)> {
    let store = TemplateStore::open(&config.template_root)?;

    let resolution = close(&config.catalog, &config.selection);
    for id in &resolution.auto_enabled {
        report
            .warnings
            .push(format!("'{id}' enabled: required by an enabled module"));
    }
    for id in resolution.state.unknown_modules(&config.catalog) {
        report.warnings.push(format!("unknown module '{id}' in selection ignored"));
    }

    config.catalog.check_templates(&config.template_root)?;
    Ok((resolution.state, store))
}

fn plan_modules<'c>(
    config: &'c PipelineConfig,
    selection: &SelectionState,
    report: &mut GenerationReport,
) -> HashMap<&'c str, std::result::Result<AssignmentPlan, String>> {
    let mut plans = HashMap::new();
    for module in selection.enabled_modules(&config.catalog) {
        let Some(requirement) = &module.peripheral else {
            continue;
        };
        let available = available_instances(&config.hardware, requirement);
        let chosen = selection
            .entry(&module.id)
            .map(|e| e.instances.clone())
            .unwrap_or_default();
        let (ordered, stale) = order_instances(&chosen, &available);
        for s in &stale {
            log::warn!("{}: instance {s} is no longer in the hardware configuration", module.id);
            report
                .warnings
                .push(format!("{}: stale instance {s} dropped", module.id));
        }
        let plan = config
            .planners
            .plan(&requirement.family, &ordered)
            .map_err(|e| e.to_string());
        if let Ok(p) = &plan {
            log::debug!("{}: planned {} instances ({})", module.id, p.entries.len(), p.kind);
        }
        plans.insert(module.id.as_str(), plan);
    }
    plans
}

fn merge_target(t: &mut Target) {
    let Ok(rendered) = &t.text else {
        return;
    };
    if !t.path.exists() {
        return;
    }
    match std::fs::read_to_string(&t.path) {
        Ok(old) => {
            let (merged, merge_report) = merge_with_report(rendered, &old);
            t.preserved = merge_report.preserved;
            t.dropped = merge_report.dropped;
            t.text = Ok(merged);
        }
        Err(e) => t.text = Err(format!("cannot read {}: {e}", t.path.display())),
    }
}

fn persist_target(t: &Target, dry_run: bool) -> Outcome {
    let text = match &t.text {
        Ok(text) => text,
        Err(reason) => {
            return Outcome::Failed {
                reason: reason.clone(),
            }
        }
    };
    if dry_run {
        let write = match std::fs::read(&t.path) {
            Ok(current) if current == text.as_bytes() => WriteStatus::Unchanged,
            Ok(_) => WriteStatus::Updated,
            Err(_) => WriteStatus::Created,
        };
        return Outcome::Generated { write };
    }
    match write_atomic(&t.path, text) {
        Ok(write) => Outcome::Generated { write },
        Err(e) => Outcome::Failed {
            reason: e.to_string(),
        },
    }
}
