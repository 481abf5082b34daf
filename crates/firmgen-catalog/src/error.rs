//! Catalog and selection error types.

use std::path::PathBuf;

/// Errors that can occur while loading the catalog or updating a selection.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two modules share an id.
    #[error("duplicate module id '{id}'")]
    DuplicateModule { id: String },

    /// A module declares a dependency that is not in the catalog.
    #[error("module '{module}' depends on unknown module '{dependency}'")]
    MissingDependency { module: String, dependency: String },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency {
        /// Module ids along the cycle; the first id is repeated at the end.
        path: Vec<String>,
    },

    /// Two modules write the same output file.
    #[error("modules '{first}' and '{second}' both write '{output}'")]
    DuplicateOutput {
        first: String,
        second: String,
        output: String,
    },

    /// A module references a template that is not in the template directory.
    #[error("module '{module}' references missing template {}", path.display())]
    MissingTemplate { module: String, path: PathBuf },

    /// A selection names a module the catalog does not know.
    #[error("unknown module '{id}'")]
    UnknownModule { id: String },

    /// Invalid catalog or selection document.
    #[error("invalid {what}: {detail}")]
    Invalid { what: &'static str, detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading or writing catalog/selection files.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
