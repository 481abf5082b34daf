//! Error types for template access.

use std::path::PathBuf;

/// Errors raised while loading templates.
///
/// Rendering and merging themselves never fail: unbound markers are left
/// in place and malformed regions degrade to "no region".
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The template directory does not exist or is not a directory.
    #[error("template directory {} is not readable", root.display())]
    TemplateRoot { root: PathBuf },

    /// A template file could not be read.
    #[error("cannot read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, RenderError>;
