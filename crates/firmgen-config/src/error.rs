//! Error types for hardware configuration operations.

use std::path::PathBuf;

/// Errors that can occur while locating or parsing a hardware configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A non-blank, non-comment line has no `=` separator.
    #[error("malformed configuration at line {line}: '{content}'")]
    MalformedConfig {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },

    /// No `.ioc` file in the project directory.
    #[error("no hardware configuration (*.ioc) found in {}", dir.display())]
    NoConfigFound {
        /// The directory that was searched.
        dir: PathBuf,
    },

    /// I/O error reading a configuration file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
