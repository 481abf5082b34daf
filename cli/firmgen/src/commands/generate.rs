//! `firmgen generate`: run the generation pipeline.

use anyhow::{bail, Context, Result};
use firmgen_generate::{generate, GenerationReport, LogSink, PipelineConfig};

use super::Project;

/// Run the pipeline and print its report.
///
/// Fails when any target failed, after the report has been printed.
pub fn run(project: &Project, dry_run: bool, report_format: Option<&str>) -> Result<()> {
    if let Some(format) = report_format {
        if format != "text" && format != "json" {
            bail!("unknown report format '{format}' (expected text or json)");
        }
    }

    let report = execute(project, dry_run)?;

    match report_format {
        Some("json") => println!("{}", report.to_json().context("serializing report")?),
        _ => print!("{report}"),
    }

    let failed = report.counts().failed;
    if failed > 0 {
        bail!("{failed} target(s) failed");
    }
    Ok(())
}

/// Build the pipeline configuration for `project` and run it.
pub(crate) fn execute(project: &Project, dry_run: bool) -> Result<GenerationReport> {
    let catalog = project.catalog()?;
    let hardware = project.hardware()?;
    let selection = project.selection()?;

    let mut config = PipelineConfig::new(
        project.name(),
        &project.output_root,
        &project.template_root,
        catalog,
        hardware,
        selection,
    );
    config.selection_path = Some(project.selection_path());
    config.dry_run = dry_run;

    log::debug!(
        "Generating {} from {} into {}",
        project.name(),
        project.template_root.display(),
        project.output_root.display()
    );
    let report = generate(config, &mut LogSink).context("generation aborted")?;
    Ok(report)
}
