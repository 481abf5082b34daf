//! Module catalog and selection bookkeeping for firmgen.
//!
//! The catalog is a static table of reusable firmware modules:
//! - **Peripheral** drivers bound to hardware instances from the configuration
//! - **Component** modules (pure software: buffers, logging, storage)
//! - **Device** drivers for external parts sitting on a peripheral bus
//!
//! A project's [`SelectionState`] records which modules are enabled, their
//! custom parameters, and the hardware instances chosen for them. Every
//! mutation goes through [`resolve`], which keeps the dependency closure of
//! enabled modules intact.

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod error;
pub mod resolution;
pub mod selection;
pub mod tree;

pub use catalog::{ModuleCatalog, CATALOG_FILE};
pub use descriptor::{
    InstanceSource, ModuleDescriptor, ModuleKind, PeripheralRequirement, TemplateRef,
};
pub use error::{CatalogError, Result};
pub use resolution::{close, resolve, Resolution, Toggle};
pub use selection::{param_value, SelectionEntry, SelectionState, SELECTION_FILE};
pub use tree::format_tree;
