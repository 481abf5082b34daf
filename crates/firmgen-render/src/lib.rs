//! Text rendering for firmgen.
//!
//! Two independent marker kinds live in templates:
//! - generated-fragment markers (`BEGIN-OF-GENERATED <name>`) that
//!   [`render`] replaces with bound text, and
//! - user-editable regions (`/* USER <NAME> BEGIN */ … /* USER <NAME> END */`)
//!   whose content [`merge`] carries over from the file already on disk.
//!
//! Both operations are pure functions over strings; file access is limited
//! to [`TemplateStore`].

pub mod error;
pub mod merge;
pub mod template;

pub use error::{RenderError, Result};
pub use merge::{extract, merge, merge_with_report, MergeReport, UserRegion, UserRegionSet};
pub use template::{markers, render, Bindings, TemplateStore, GENERATED_MARKER};
