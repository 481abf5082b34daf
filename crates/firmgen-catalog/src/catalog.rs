//! The module catalog: validated, immutable table of module descriptors.
//!
//! A catalog is either the built-in table or a `catalog.toml` shipped with
//! the template directory:
//! ```toml
//! [[module]]
//! id = "can"
//! kind = "peripheral"
//! dependencies = []
//! peripheral = { family = "CAN" }
//! [[module.templates]]
//! template = "peripheral/can/bsp_can.c.tpl"
//! output = "Modules/Peripheral/can/bsp_can.c"
//! ```
//! Validation happens once, at construction: ids are unique, every
//! dependency exists, no two modules write the same output, and the
//! dependency graph is acyclic.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::ModuleDescriptor;
use crate::error::{CatalogError, Result};

/// File name of a catalog shipped inside a template directory.
pub const CATALOG_FILE: &str = "catalog.toml";

/// On-disk catalog document.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default, rename = "module")]
    modules: Vec<ModuleDescriptor>,
}

/// A validated table of modules, kept in declaration order.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDescriptor>,
    index: HashMap<String, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl ModuleCatalog {
    /// Build and validate a catalog.
    pub fn new(modules: Vec<ModuleDescriptor>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, module) in modules.iter().enumerate() {
            if index.insert(module.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateModule {
                    id: module.id.clone(),
                });
            }
        }

        let mut outputs: HashMap<&str, &str> = HashMap::new();
        for module in &modules {
            for dep in &module.dependencies {
                if !index.contains_key(dep) {
                    return Err(CatalogError::MissingDependency {
                        module: module.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            for t in &module.templates {
                if let Some(first) = outputs.insert(t.output.as_str(), module.id.as_str()) {
                    return Err(CatalogError::DuplicateOutput {
                        first: first.to_string(),
                        second: module.id.clone(),
                        output: t.output.clone(),
                    });
                }
            }
        }

        let catalog = ModuleCatalog { modules, index };
        if let Some(path) = catalog.find_cycle() {
            return Err(CatalogError::CyclicDependency { path });
        }
        Ok(catalog)
    }

    /// Parse a catalog from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let doc: CatalogDocument = toml::from_str(input)?;
        Self::new(doc.modules)
    }

    /// Load a catalog from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&content)?;
        log::debug!("Loaded {} modules from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Use `<template_root>/catalog.toml` when present, else the built-in table.
    pub fn for_template_root(template_root: &Path) -> Result<Self> {
        let path = template_root.join(CATALOG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Serialize this catalog to TOML.
    pub fn to_toml(&self) -> Result<String> {
        let doc = CatalogDocument {
            modules: self.modules.clone(),
        };
        Ok(toml::to_string_pretty(&doc)?)
    }

    /// Look up a module by id.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    /// Whether a module id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All modules in declaration order.
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Modules that directly depend on `id`, in declaration order.
    pub fn dependents(&self, id: &str) -> Vec<&ModuleDescriptor> {
        self.modules
            .iter()
            .filter(|m| m.dependencies.iter().any(|d| d == id))
            .collect()
    }

    /// Check that every referenced template exists under `root`.
    pub fn check_templates(&self, root: &Path) -> Result<()> {
        for module in &self.modules {
            for t in &module.templates {
                let path = root.join(&t.template);
                if !path.is_file() {
                    return Err(CatalogError::MissingTemplate {
                        module: module.id.clone(),
                        path,
                    });
                }
            }
        }
        Ok(())
    }

    /// Depth-first search in declaration order; returns the first cycle found.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.modules.len()];
        let mut stack = Vec::new();
        for start in 0..self.modules.len() {
            if marks[start] == Mark::Unvisited {
                if let Some(cycle) = self.visit(start, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(&self, i: usize, marks: &mut [Mark], stack: &mut Vec<usize>) -> Option<Vec<String>> {
        marks[i] = Mark::InProgress;
        stack.push(i);
        for dep in &self.modules[i].dependencies {
            let Some(&j) = self.index.get(dep) else {
                continue;
            };
            match marks[j] {
                Mark::InProgress => {
                    let pos = stack.iter().position(|&k| k == j).unwrap_or(0);
                    let mut path: Vec<String> = stack[pos..]
                        .iter()
                        .map(|&k| self.modules[k].id.clone())
                        .collect();
                    path.push(self.modules[j].id.clone());
                    return Some(path);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = self.visit(j, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        stack.pop();
        marks[i] = Mark::Done;
        None
    }
}
