//! Error types for planning and generation.

use std::path::PathBuf;

use firmgen_catalog::CatalogError;
use firmgen_render::RenderError;
use thiserror::Error;

/// Errors raised while assigning shared hardware resources.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no hardware instances chosen for {family}")]
    NoInstances { family: String },

    #[error("filter banks exhausted: {instance} would need bank {bank} of {available}")]
    BankExhausted {
        instance: String,
        bank: u32,
        available: u32,
    },

    #[error("EXTI line {line} claimed by both {first} and {second}")]
    ExtiLineConflict {
        line: u8,
        first: String,
        second: String,
    },

    #[error("timer channel {instance} chosen twice")]
    DuplicateChannel { instance: String },

    #[error("'{instance}' is not a valid {family} instance")]
    InvalidInstance { family: String, instance: String },
}

/// Fatal errors of the generation pipeline.
///
/// Planning failures are per-module and land in the report instead.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
