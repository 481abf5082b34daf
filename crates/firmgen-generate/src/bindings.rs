//! Template bindings derived from one module's selection and plan.
//!
//! Marker names a template may use:
//!
//! | Marker | Content |
//! |---|---|
//! | `banner` | one-line provenance comment |
//! | `includes` | `#include` of every dependency header |
//! | `params` | `#define` per custom parameter |
//! | `rtos` | `#define <MODULE>_USE_RTOS 0/1` |
//! | `instance_count` | `#define <MODULE>_INSTANCE_COUNT n` |
//! | `handles` | `extern` declarations of HAL handles |
//! | `instance_table` | one initializer row per assignment |
//! | `bank_setup` | shared filter-bank configuration calls |
//! | `irq_enable` | interrupt activation statements, each once |
//! | `dispatch` | HAL callback bodies routing to module dispatch |
//! | `pins` | GPIO pin table rows |
//! | `flash_layout` | flash geometry and settings-sector defines |
//! | `flash_sectors` | sector table rows |

use std::fmt::Write as _;

use firmgen_catalog::{InstanceSource, ModuleCatalog, ModuleDescriptor, SelectionEntry};
use firmgen_config::HardwareConfig;
use firmgen_render::Bindings;

use crate::plan::{AssignmentPlan, PlannerKind, CAN_SECONDARY_START_BANK};

/// Project-wide inputs shared by every module's bindings.
#[derive(Debug, Clone, Copy)]
pub struct BindingContext<'a> {
    pub project: &'a str,
    pub catalog: &'a ModuleCatalog,
    pub config: &'a HardwareConfig,
}

/// Build the bindings of one enabled module.
pub fn module_bindings(
    ctx: &BindingContext<'_>,
    module: &ModuleDescriptor,
    entry: Option<&SelectionEntry>,
    plan: Option<&AssignmentPlan>,
) -> Bindings {
    let prefix = module.macro_prefix();
    let mcu = ctx.config.mcu_name().unwrap_or("unknown MCU");
    let mut b = Bindings::new();

    b.insert(
        "banner".into(),
        format!("/* Generated by firmgen for {} ({mcu}), module {}. */", ctx.project, module.id),
    );
    b.insert("includes".into(), includes(ctx.catalog, module));
    b.insert("params".into(), params(&prefix, entry));
    b.insert(
        "rtos".into(),
        format!("#define {prefix}_USE_RTOS {}", u8::from(ctx.config.freertos_enabled())),
    );
    let (flash_layout, flash_sectors) = flash(ctx.config);
    b.insert("flash_layout".into(), flash_layout);
    b.insert("flash_sectors".into(), flash_sectors);

    if let Some(plan) = plan {
        b.insert(
            "instance_count".into(),
            format!("#define {prefix}_INSTANCE_COUNT {}u", plan.entries.len()),
        );
        b.insert("handles".into(), handles(plan));
        b.insert("instance_table".into(), instance_table(plan));
        b.insert("bank_setup".into(), bank_setup(&module.id, plan));
        b.insert("irq_enable".into(), irq_enable(plan));
        b.insert("dispatch".into(), dispatch(&module.id, plan));
        let pin_sourced = module
            .peripheral
            .as_ref()
            .is_some_and(|p| {
                matches!(p.source, InstanceSource::Pins | InstanceSource::InterruptPins)
            });
        if pin_sourced {
            b.insert("pins".into(), pins(ctx.config, plan));
        }
    }
    b
}

/// HAL handle type of a family, if its instances have handles.
fn handle_type(family: &str) -> Option<&'static str> {
    match family.to_ascii_uppercase().as_str() {
        "CAN" => Some("CAN_HandleTypeDef"),
        "UART" | "USART" => Some("UART_HandleTypeDef"),
        "SPI" => Some("SPI_HandleTypeDef"),
        "I2C" => Some("I2C_HandleTypeDef"),
        "ADC" => Some("ADC_HandleTypeDef"),
        "PWM" | "TIM" => Some("TIM_HandleTypeDef"),
        _ => None,
    }
}

fn includes(catalog: &ModuleCatalog, module: &ModuleDescriptor) -> String {
    module
        .dependencies
        .iter()
        .filter_map(|d| catalog.get(d))
        .flat_map(|d| d.templates.iter())
        .filter(|t| t.output.ends_with(".h"))
        .map(|t| {
            let header = t.output.rsplit('/').next().unwrap_or(&t.output);
            format!("#include \"{header}\"")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn params(prefix: &str, entry: Option<&SelectionEntry>) -> String {
    let Some(entry) = entry else {
        return String::new();
    };
    entry
        .params
        .iter()
        .map(|(key, value)| {
            let name: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
                .collect();
            format!("#define {prefix}_{name} {}", c_literal(value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn c_literal(value: &toml::Value) -> String {
    match value {
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => format!("{f:?}f"),
        toml::Value::Boolean(b) => u8::from(*b).to_string(),
        toml::Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        toml::Value::Array(items) => {
            let items: Vec<String> = items.iter().map(c_literal).collect();
            format!("{{ {} }}", items.join(", "))
        }
        other => format!("\"{other}\""),
    }
}

fn handles(plan: &AssignmentPlan) -> String {
    let Some(ty) = handle_type(&plan.family) else {
        return String::new();
    };
    let mut seen: Vec<&str> = Vec::new();
    for e in &plan.entries {
        if !seen.contains(&e.handle.as_str()) {
            seen.push(&e.handle);
        }
    }
    seen.iter()
        .map(|h| format!("extern {ty} {h};"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn instance_table(plan: &AssignmentPlan) -> String {
    let by_reference = handle_type(&plan.family).is_some();
    plan.entries
        .iter()
        .map(|e| {
            let handle = if by_reference {
                format!("&{}", e.handle)
            } else {
                e.handle.clone()
            };
            format!(
                "    {{ \"{}\", {handle}, {}u, {}u }},",
                e.instance, e.slot, e.bank
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn bank_setup(id: &str, plan: &AssignmentPlan) -> String {
    if plan.kind != PlannerKind::SharedFilterBank {
        return String::new();
    }
    let mut out = Vec::new();
    for e in &plan.entries {
        if e.configures {
            out.push(format!(
                "    {id}_filter_table_init(&{}, {CAN_SECONDARY_START_BANK}u);",
                e.handle
            ));
        }
        out.push(format!(
            "    {id}_filter_config(&{}, {}u, CAN_FILTER_FIFO{});",
            e.handle, e.bank, e.slot
        ));
    }
    out.join("\n")
}

fn irq_enable(plan: &AssignmentPlan) -> String {
    plan.irq_directives()
        .iter()
        .map(|d| format!("    {}", d.activation))
        .collect::<Vec<_>>()
        .join("\n")
}

fn dispatch(id: &str, plan: &AssignmentPlan) -> String {
    let mut callbacks: Vec<&str> = Vec::new();
    for d in plan.dispatch_entries() {
        if !callbacks.contains(&d.callback.as_str()) {
            callbacks.push(&d.callback);
        }
    }

    let ty = handle_type(&plan.family);
    let mut out = String::new();
    for cb in callbacks {
        if !out.is_empty() {
            out.push('\n');
        }
        match ty {
            Some(ty) => {
                let _ = writeln!(out, "void {cb}({ty} *handle)");
            }
            None => {
                let _ = writeln!(out, "void {cb}(uint16_t GPIO_Pin)");
            }
        }
        out.push_str("{\n");
        for (index, e) in plan.entries.iter().enumerate() {
            let Some(d) = e.dispatch.as_ref().filter(|d| d.callback == cb) else {
                continue;
            };
            let test = match ty {
                Some(_) => format!("handle == &{}", e.handle),
                None => format!("GPIO_Pin == {}", e.handle),
            };
            let _ = writeln!(out, "    if ({test}) {{");
            let _ = writeln!(out, "        {id}_dispatch({index}u, {}u);", d.ordinal);
            out.push_str("        return;\n    }\n");
        }
        out.push_str("}\n");
    }
    out
}

fn pins(config: &HardwareConfig, plan: &AssignmentPlan) -> String {
    let candidates = config.gpio_candidates(false);
    plan.entries
        .iter()
        .filter_map(|e| candidates.iter().find(|c| c.pin == e.instance))
        .map(|c| {
            let label = c.label.as_deref().unwrap_or(&c.pin);
            format!(
                "    {{ \"{label}\", GPIO{}, GPIO_PIN_{} }},",
                c.port, c.number
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn flash(config: &HardwareConfig) -> (String, String) {
    let Some(layout) = config.flash_layout() else {
        let mcu = config.mcu_name().unwrap_or("unknown MCU");
        return (format!("#error \"no flash layout known for {mcu}\""), String::new());
    };
    let mut defines = vec![
        format!("#define FLASH_LAYOUT_BASE 0x{:08X}u", layout.base),
        format!("#define FLASH_LAYOUT_SIZE 0x{:08X}u", layout.total_size),
        format!("#define FLASH_LAYOUT_BANKS {}u", layout.banks.len()),
        format!("#define FLASH_LAYOUT_SECTORS {}u", layout.sectors.len()),
    ];
    if let Some(last) = layout.last_sector() {
        defines.push(format!("#define FLASH_SETTINGS_ADDR 0x{:08X}u", last.address));
        defines.push(format!("#define FLASH_SETTINGS_SIZE 0x{:X}u", last.size));
        defines.push(format!("#define FLASH_SETTINGS_SECTOR {}u", last.index));
        defines.push(format!("#define FLASH_SETTINGS_BANK {}u", last.bank));
    }
    let sectors = layout
        .sectors
        .iter()
        .map(|s| {
            format!(
                "    {{ 0x{:08X}u, 0x{:X}u, {}u, {}u }},",
                s.address, s.size, s.bank, s.index
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    (defines.join("\n"), sectors)
}
