//! Generation engine for firmgen.
//!
//! Turns a hardware configuration, a module catalog and a selection into a
//! source tree through a staged pipeline: instance ordering and assignment
//! planning, template rendering, user-region merging, and atomic persistence.
//!
//! Every step except the final write is a pure function of its inputs, so
//! running the pipeline twice over unchanged inputs rewrites nothing.

pub mod bindings;
pub mod error;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod sink;
pub mod writer;

pub use bindings::{module_bindings, BindingContext};
pub use error::{GenerateError, PlanError, Result};
pub use pipeline::{available_instances, generate, CancellationToken, PipelineConfig, Stage};
pub use plan::{
    order_instances, Assignment, AssignmentPlan, DispatchEntry, IrqDirective, PlannerKind,
    PlannerRegistry,
};
pub use report::{GenerationReport, GenerationResult, Outcome, OutcomeCounts};
pub use sink::{FileEvent, LogSink, NullSink, ProgressSink};
pub use writer::{write_atomic, WriteStatus};
