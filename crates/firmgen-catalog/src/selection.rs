//! Persisted per-project module selection.
//!
//! Stored as TOML under the project root:
//! ```toml
//! [modules.can]
//! enabled = true
//! instances = ["CAN1", "CAN2"]
//!
//! [modules.can.params]
//! rx_queue_depth = 16
//! ```
//! Entries are keyed by module id in sorted order, so saving an unchanged
//! state reproduces the same document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::ModuleCatalog;
use crate::descriptor::ModuleDescriptor;
use crate::error::{CatalogError, Result};

/// Selection record location, relative to the project root.
pub const SELECTION_FILE: &str = ".firmgen/selection.toml";

/// Selection record of one module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionEntry {
    #[serde(default)]
    pub enabled: bool,
    /// Chosen hardware instances (peripheral modules only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<String>,
    /// Custom parameters rendered into the module's templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, toml::Value>,
}

/// Selection records of all modules in a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    modules: BTreeMap<String, SelectionEntry>,
}

impl SelectionState {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a selection document.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Serialize to a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from `path`; a missing file is an empty selection.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No selection record at {}; starting empty", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Write to `path`, creating parent directories.
    ///
    /// The record is written to a temporary file beside `path` and renamed
    /// over it, so an interrupted save leaves the previous record intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };
        let text = self.to_toml()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        log::debug!("Saved selection for {} modules to {}", self.modules.len(), path.display());
        Ok(())
    }

    /// Whether a module is enabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.modules.get(id).is_some_and(|e| e.enabled)
    }

    /// The record of one module, if any.
    pub fn entry(&self, id: &str) -> Option<&SelectionEntry> {
        self.modules.get(id)
    }

    /// The record of one module, created disabled if absent.
    pub fn entry_mut(&mut self, id: &str) -> &mut SelectionEntry {
        self.modules.entry(id.to_string()).or_default()
    }

    /// All records, sorted by module id.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SelectionEntry)> {
        self.modules.iter().map(|(id, e)| (id.as_str(), e))
    }

    /// Ids of enabled modules, sorted.
    pub fn enabled_ids(&self) -> Vec<&str> {
        self.entries()
            .filter(|(_, e)| e.enabled)
            .map(|(id, _)| id)
            .collect()
    }

    /// Enabled modules in catalog declaration order.
    pub fn enabled_modules<'c>(&self, catalog: &'c ModuleCatalog) -> Vec<&'c ModuleDescriptor> {
        catalog
            .modules()
            .iter()
            .filter(|m| self.is_enabled(&m.id))
            .collect()
    }

    /// Ids recorded here that the catalog does not know.
    pub fn unknown_modules(&self, catalog: &ModuleCatalog) -> Vec<&str> {
        self.modules
            .keys()
            .filter(|id| !catalog.contains(id))
            .map(String::as_str)
            .collect()
    }

    /// Replace the chosen hardware instances of a module.
    pub fn set_instances(&mut self, id: &str, instances: Vec<String>) {
        self.entry_mut(id).instances = instances;
    }

    /// Set one custom parameter of a module.
    pub fn set_param(&mut self, id: &str, key: &str, value: toml::Value) {
        self.entry_mut(id).params.insert(key.to_string(), value);
    }
}

/// Interpret a command-line parameter value: integer, float, boolean, else string.
pub fn param_value(raw: &str) -> toml::Value {
    if let Ok(i) = raw.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        toml::Value::Float(f)
    } else if let Ok(b) = raw.parse::<bool>() {
        toml::Value::Boolean(b)
    } else {
        toml::Value::String(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SelectionState {
        let mut state = SelectionState::new();
        state.entry_mut("can").enabled = true;
        state.set_instances("can", vec!["CAN1".into(), "CAN2".into()]);
        state.set_param("can", "rx_queue_depth", toml::Value::Integer(16));
        state.set_param("can", "name", toml::Value::String("bus".into()));
        state.entry_mut("ringbuf").enabled = true;
        state.entry_mut("shell").enabled = false;
        state
    }

    #[test]
    fn toml_round_trip_is_lossless() {
        let state = sample();
        let text = state.to_toml().unwrap();
        let reparsed = SelectionState::parse(&text).unwrap();
        assert_eq!(reparsed, state);
        // A no-op save reproduces the same document.
        assert_eq!(reparsed.to_toml().unwrap(), text);
    }

    #[test]
    fn parse_document() {
        let input = r#"
[modules.uart]
enabled = true
instances = ["USART1"]

[modules.uart.params]
baud = 115200

[modules.log]
enabled = false
"#;
        let state = SelectionState::parse(input).unwrap();
        assert!(state.is_enabled("uart"));
        assert!(!state.is_enabled("log"));
        assert!(!state.is_enabled("missing"));
        let uart = state.entry("uart").unwrap();
        assert_eq!(uart.instances, vec!["USART1"]);
        assert_eq!(uart.params["baud"], toml::Value::Integer(115200));
        assert_eq!(state.enabled_ids(), vec!["uart"]);
    }

    #[test]
    fn load_missing_is_empty_and_save_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SELECTION_FILE);
        assert_eq!(SelectionState::load(&path).unwrap(), SelectionState::new());

        let state = sample();
        state.save(&path).unwrap();
        assert_eq!(SelectionState::load(&path).unwrap(), state);
    }

    #[test]
    fn save_replaces_record_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SELECTION_FILE);
        sample().save(&path).unwrap();

        let mut smaller = SelectionState::new();
        smaller.entry_mut("crc").enabled = true;
        smaller.save(&path).unwrap();

        assert_eq!(SelectionState::load(&path).unwrap(), smaller);
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("selection.toml")]);
    }

    #[test]
    fn reject_invalid_document() {
        assert!(SelectionState::parse("[modules.x]\nenabled = \"yes\"\n").is_err());
    }

    #[test]
    fn enabled_modules_follow_catalog_order() {
        let catalog = ModuleCatalog::builtin();
        let mut state = SelectionState::new();
        state.entry_mut("shell").enabled = true;
        state.entry_mut("uart").enabled = true;
        state.entry_mut("retired_module").enabled = true;
        let ids: Vec<&str> = state
            .enabled_modules(&catalog)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["uart", "shell"]);
        assert_eq!(state.unknown_modules(&catalog), vec!["retired_module"]);
    }

    #[test]
    fn param_value_types() {
        assert_eq!(param_value("42"), toml::Value::Integer(42));
        assert_eq!(param_value("2.5"), toml::Value::Float(2.5));
        assert_eq!(param_value("true"), toml::Value::Boolean(true));
        assert_eq!(param_value("hello"), toml::Value::String("hello".into()));
    }
}
