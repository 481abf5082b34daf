//! `firmgen info`: summary of the hardware configuration.

use anyhow::Result;
use firmgen_config::HardwareConfig;
use firmgen_generate::available_instances;

use super::Project;

pub fn run(project: &Project) -> Result<()> {
    let path = project.config_path()?;
    let config = project.hardware()?;
    let catalog = project.catalog()?;

    println!("=== Hardware: {} ===", path.display());
    println!("MCU:  {}", config.mcu_name().unwrap_or("unknown"));
    println!("RTOS: {}", if config.freertos_enabled() { "FreeRTOS" } else { "none" });
    println!();

    print_flash(&config);

    println!("--- Instances ---");
    let mut seen: Vec<&str> = Vec::new();
    for module in catalog.modules() {
        let Some(req) = &module.peripheral else {
            continue;
        };
        if seen.contains(&req.family.as_str()) {
            continue;
        }
        seen.push(&req.family);
        let instances = available_instances(&config, req);
        if instances.is_empty() {
            println!("  {:<6} (none)", req.family);
        } else {
            println!("  {:<6} {}", req.family, instances.join(", "));
        }
    }
    Ok(())
}

fn print_flash(config: &HardwareConfig) {
    println!("--- Flash ---");
    let Some(layout) = config.flash_layout() else {
        println!("  (no layout known for this MCU)");
        println!();
        return;
    };
    println!(
        "  {} KiB at 0x{:08X}, {} bank(s), {} sectors",
        layout.total_size / 1024,
        layout.base,
        layout.banks.len(),
        layout.sectors.len()
    );
    for bank in &layout.banks {
        println!(
            "  bank {}: 0x{:08X} {} KiB, {} sectors",
            bank.number,
            bank.base,
            bank.size / 1024,
            bank.sector_count
        );
    }
    if let Some(last) = layout.last_sector() {
        println!(
            "  last sector: {} (0x{:08X}, {} KiB)",
            last.index,
            last.address,
            last.size / 1024
        );
    }
    println!();
}
