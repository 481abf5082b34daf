//! Progress reporting during a generation run.

use std::path::PathBuf;

use crate::pipeline::Stage;
use crate::report::{GenerationReport, Outcome};

/// One file operation of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub module: String,
    /// Absolute or output-root-joined path of the target.
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Receiver of pipeline progress.
pub trait ProgressSink {
    /// Called on every stage transition.
    fn stage(&mut self, stage: &Stage);

    /// Called once per target after its outcome is known.
    fn file(&mut self, event: &FileEvent);

    /// Called once when the run is over, cancelled or not.
    fn finished(&mut self, report: &GenerationReport);
}

/// A sink that ignores everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn stage(&mut self, _stage: &Stage) {}
    fn file(&mut self, _event: &FileEvent) {}
    fn finished(&mut self, _report: &GenerationReport) {}
}

/// A sink forwarding to the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn stage(&mut self, stage: &Stage) {
        log::debug!("stage: {stage}");
    }

    fn file(&mut self, event: &FileEvent) {
        match &event.outcome {
            Outcome::Failed { reason } => {
                log::error!("{} [{}]: {reason}", event.path.display(), event.module)
            }
            Outcome::Generated { write } => {
                log::info!("{} [{}]: {write:?}", event.path.display(), event.module)
            }
            other => log::debug!("{} [{}]: {}", event.path.display(), event.module, other.label()),
        }
    }

    fn finished(&mut self, report: &GenerationReport) {
        let c = report.counts();
        log::info!(
            "{}: {} generated, {} unchanged, {} skipped, {} failed in {} ms",
            report.project,
            c.generated,
            c.unchanged,
            c.skipped_present,
            c.failed,
            report.duration_ms
        );
    }
}
