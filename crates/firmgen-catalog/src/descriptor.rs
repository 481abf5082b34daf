//! Module descriptors: the static metadata of one selectable module.

use serde::{Deserialize, Serialize};

/// What a module contributes to the firmware tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// On-chip peripheral driver bound to configured hardware instances.
    Peripheral,
    /// Hardware-independent software component.
    Component,
    /// Driver for an external device attached through a peripheral.
    Device,
}

impl ModuleKind {
    /// Lower-case name used in template paths and listings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Peripheral => "peripheral",
            Self::Component => "component",
            Self::Device => "device",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the selectable hardware instances of a peripheral module come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceSource {
    /// `Mcu.IP<N>` declarations of the module's family.
    #[default]
    Declared,
    /// Pins usable as plain GPIO.
    Pins,
    /// Pins configured as external-interrupt lines.
    InterruptPins,
    /// Timer channels routed to pins.
    PwmChannels,
}

/// Hardware a peripheral module binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralRequirement {
    /// Family id (`CAN`, `UART`, `EXTI`, …), also the planner registry key.
    pub family: String,
    #[serde(default)]
    pub source: InstanceSource,
}

/// One template rendered by a module and the file it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    /// Path relative to the template directory.
    pub template: String,
    /// Path relative to the output directory.
    pub output: String,
}

/// Static description of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Unique module id.
    pub id: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub templates: Vec<TemplateRef>,
    /// Ids of modules that must be enabled whenever this one is.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub peripheral: Option<PeripheralRequirement>,
}

impl ModuleDescriptor {
    /// Whether the module needs hardware instances chosen before generation.
    pub fn requires_instances(&self) -> bool {
        self.peripheral.is_some()
    }

    /// The module id as a C identifier prefix (`flash_store` -> `FLASH_STORE`).
    pub fn macro_prefix(&self) -> String {
        self.id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_minimal_descriptor() {
        let toml_str = r#"
id = "ringbuf"
kind = "component"
"#;
        let d: ModuleDescriptor = toml::from_str(toml_str).unwrap();
        assert_eq!(d.id, "ringbuf");
        assert_eq!(d.kind, ModuleKind::Component);
        assert!(d.templates.is_empty());
        assert!(!d.requires_instances());
    }

    #[test]
    fn deserialize_peripheral_descriptor() {
        let toml_str = r#"
id = "button"
kind = "peripheral"
dependencies = ["gpio"]

[peripheral]
family = "EXTI"
source = "interrupt-pins"

[[templates]]
template = "peripheral/button/button.c.tpl"
output = "Modules/button/button.c"
"#;
        let d: ModuleDescriptor = toml::from_str(toml_str).unwrap();
        let req = d.peripheral.as_ref().unwrap();
        assert_eq!(req.family, "EXTI");
        assert_eq!(req.source, InstanceSource::InterruptPins);
        assert_eq!(d.templates[0].output, "Modules/button/button.c");
    }

    #[test]
    fn source_defaults_to_declared() {
        let req: PeripheralRequirement = toml::from_str("family = \"CAN\"").unwrap();
        assert_eq!(req.source, InstanceSource::Declared);
    }

    #[test]
    fn reject_unknown_kind() {
        let toml_str = "id = \"x\"\nkind = \"gadget\"\n";
        assert!(toml::from_str::<ModuleDescriptor>(toml_str).is_err());
    }

    #[test]
    fn macro_prefix() {
        let d: ModuleDescriptor =
            toml::from_str("id = \"flash-store\"\nkind = \"component\"").unwrap();
        assert_eq!(d.macro_prefix(), "FLASH_STORE");
    }
}
