//! Locating and loading the hardware configuration of a project.
//!
//! A project directory is expected to hold exactly one `.ioc` file. When
//! several are present the first in filename order is used and the rest are
//! reported, so repeated runs always pick the same file.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::parse::{parse, HardwareConfig};

/// File extension of hardware configuration files.
pub const CONFIG_EXTENSION: &str = "ioc";

/// Outcome of searching a project directory for its configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDiscovery {
    /// The selected configuration file.
    pub path: PathBuf,
    /// Other candidates that were ignored, in filename order.
    pub ignored: Vec<PathBuf>,
}

/// Find the hardware configuration file in `project_dir`.
pub fn discover_config(project_dir: &Path) -> Result<ConfigDiscovery> {
    let io_err = |source| ConfigError::Io {
        path: project_dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    if project_dir.is_dir() {
        for entry in std::fs::read_dir(project_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_config = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(CONFIG_EXTENSION));
            if is_config {
                candidates.push(path);
            }
        }
    }
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut candidates = candidates.into_iter();
    let path = candidates.next().ok_or_else(|| ConfigError::NoConfigFound {
        dir: project_dir.to_path_buf(),
    })?;
    let ignored: Vec<PathBuf> = candidates.collect();
    if !ignored.is_empty() {
        log::warn!(
            "{} configuration files in {}; using {} and ignoring {}",
            ignored.len() + 1,
            project_dir.display(),
            path.display(),
            ignored
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    Ok(ConfigDiscovery { path, ignored })
}

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> Result<HardwareConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&text)?;
    log::debug!("Parsed {} entries from {}", config.len(), path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("board.ioc"), "Mcu.Name=STM32F103C8Tx\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let found = discover_config(dir.path()).unwrap();
        assert_eq!(found.path, dir.path().join("board.ioc"));
        assert!(found.ignored.is_empty());
    }

    #[test]
    fn discover_none() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoConfigFound { .. }));
    }

    #[test]
    fn discover_many_picks_first_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.ioc"), "").unwrap();
        std::fs::write(dir.path().join("alpha.ioc"), "").unwrap();
        std::fs::write(dir.path().join("mid.IOC"), "").unwrap();

        let found = discover_config(dir.path()).unwrap();
        assert_eq!(found.path, dir.path().join("alpha.ioc"));
        assert_eq!(
            found.ignored,
            vec![dir.path().join("mid.IOC"), dir.path().join("zeta.ioc")]
        );
    }

    #[test]
    fn discover_ignores_directories_named_like_configs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("old.ioc")).unwrap();
        assert!(discover_config(dir.path()).is_err());
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ioc");
        std::fs::write(&path, "no separator here\n").unwrap();
        assert!(matches!(
            load_config(&path).unwrap_err(),
            ConfigError::MalformedConfig { line: 1, .. }
        ));
    }

    #[test]
    fn load_missing_file() {
        let err = load_config(Path::new("/nonexistent/board.ioc")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
