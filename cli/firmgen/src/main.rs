//! firmgen CLI: select modules for a board and generate their sources.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};

use commands::{Overrides, Project};
use manifest::FirmgenManifest;

#[derive(Parser)]
#[command(name = "firmgen", version, about = "Firmware scaffolding generator")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Template directory (overrides [templates] path)
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Output directory (overrides [output] dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Hardware configuration file (overrides [project] config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new firmgen project
    Init {
        /// Project name
        name: String,
    },
    /// Show MCU, flash layout and peripheral instances
    Info,
    /// List catalog modules and their selection status
    Modules,
    /// Enable modules and their dependencies
    Enable {
        #[arg(required = true)]
        modules: Vec<String>,
    },
    /// Disable modules (dependencies stay enabled)
    Disable {
        #[arg(required = true)]
        modules: Vec<String>,
    },
    /// Set a custom module parameter
    Set {
        module: String,
        key: String,
        value: String,
    },
    /// Choose the hardware instances of a peripheral module
    Instances {
        module: String,
        /// Instances to bind; lists the choices when omitted
        instances: Vec<String>,
    },
    /// Show resource assignments for the enabled peripherals
    Plan {
        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },
    /// Show the dependency tree of the selection
    Tree,
    /// Generate sources for the selected modules
    Generate {
        /// Compute everything, write nothing
        #[arg(long)]
        dry_run: bool,
        /// Report format (text, json)
        #[arg(long)]
        report: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let overrides = Overrides {
        templates: cli.templates,
        output: cli.output,
        config: cli.config,
    };

    match cli.command {
        Commands::Init { name } => commands::init::run(&name),

        Commands::Info => {
            let project = load_project(&cwd, &overrides)?;
            commands::info::run(&project)
        }

        Commands::Modules => {
            let project = load_project(&cwd, &overrides)?;
            commands::modules::run(&project)
        }

        Commands::Enable { modules } => {
            let project = load_project(&cwd, &overrides)?;
            commands::select::enable(&project, &modules).map(|_| ())
        }

        Commands::Disable { modules } => {
            let project = load_project(&cwd, &overrides)?;
            commands::select::disable(&project, &modules).map(|_| ())
        }

        Commands::Set { module, key, value } => {
            let project = load_project(&cwd, &overrides)?;
            commands::select::set(&project, &module, &key, &value)
        }

        Commands::Instances { module, instances } => {
            let project = load_project(&cwd, &overrides)?;
            commands::select::instances(&project, &module, &instances)
        }

        Commands::Plan { format } => {
            let project = load_project(&cwd, &overrides)?;
            commands::plan::run(&project, format.as_deref())
        }

        Commands::Tree => {
            let project = load_project(&cwd, &overrides)?;
            commands::tree::run(&project)
        }

        Commands::Generate { dry_run, report } => {
            let project = load_project(&cwd, &overrides)?;
            commands::generate::run(&project, dry_run, report.as_deref())
        }
    }
}

/// Load manifest, returning error if not found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(FirmgenManifest, PathBuf)> {
    match FirmgenManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => anyhow::bail!("no firmgen.toml found (run `firmgen init` first)"),
    }
}

fn load_project(cwd: &Path, overrides: &Overrides) -> anyhow::Result<Project> {
    let (manifest, dir) = load_manifest_required(cwd)?;
    Ok(Project::new(dir, manifest, cwd, overrides))
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    use firmgen_catalog::{SelectionState, CATALOG_FILE, SELECTION_FILE};
    use firmgen_generate::{Outcome, WriteStatus};

    const IOC: &str = "\
#MicroXplorer Configuration settings - do not modify
Mcu.UserName=STM32F407VGTx
Mcu.IP0=CAN1
Mcu.IP1=CAN2
Mcu.IP2=USART2
Mcu.IP3=NVIC
PC13-ANTI_TAMP.Signal=GPXTI13
PC13-ANTI_TAMP.GPIO_Label=USER_KEY
";

    const CATALOG: &str = r#"
[[module]]
id = "can"
kind = "peripheral"
peripheral = { family = "CAN" }
templates = [{ template = "can.c.tpl", output = "Modules/can/bsp_can.c" }]

[[module]]
id = "ringbuf"
kind = "component"
templates = [{ template = "ringbuf.h.tpl", output = "Modules/ringbuf/ringbuf.h" }]

[[module]]
id = "can_motor"
kind = "device"
dependencies = ["can", "ringbuf"]
templates = [{ template = "can_motor.h.tpl", output = "Modules/can_motor/can_motor.h" }]
"#;

    const CAN_TEMPLATE: &str = "\
/* BEGIN-OF-GENERATED banner */
#include \"bsp_can.h\"

/* BEGIN-OF-GENERATED handles */

void bsp_can_init(void)
{
/* BEGIN-OF-GENERATED bank_setup */
/* BEGIN-OF-GENERATED irq_enable */
    /* USER CAN INIT BEGIN */
    /* USER CAN INIT END */
}
";

    /// Scaffold a project with a board config and a three-module template set.
    fn board_project(root: &Path) -> Project {
        let project_path = root.join("board");
        commands::init::create_project(&project_path, "board").unwrap();
        std::fs::write(project_path.join("board.ioc"), IOC).unwrap();

        let templates = project_path.join("templates");
        std::fs::write(templates.join(CATALOG_FILE), CATALOG).unwrap();
        std::fs::write(templates.join("can.c.tpl"), CAN_TEMPLATE).unwrap();
        std::fs::write(
            templates.join("ringbuf.h.tpl"),
            "#pragma once\n/* BEGIN-OF-GENERATED params */\n",
        )
        .unwrap();
        std::fs::write(
            templates.join("can_motor.h.tpl"),
            "#pragma once\n/* BEGIN-OF-GENERATED includes */\n/* BEGIN-OF-GENERATED params */\n",
        )
        .unwrap();

        let (manifest, dir) = load_manifest_required(&project_path).unwrap();
        Project::new(dir, manifest, &project_path, &Overrides::default())
    }

    fn selection(project: &Project) -> SelectionState {
        SelectionState::load(&project.dir.join(SELECTION_FILE)).unwrap()
    }

    /// Full workflow: init → enable → generate → edit → regenerate.
    #[test]
    fn init_enable_generate_regenerate_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        let resolution = commands::select::enable(&project, &["can_motor".to_string()]).unwrap();
        assert_eq!(resolution.auto_enabled, vec!["can", "ringbuf"]);
        let state = selection(&project);
        assert_eq!(state.enabled_ids(), vec!["can", "can_motor", "ringbuf"]);
        assert_eq!(state.entry("can").unwrap().instances, vec!["CAN1", "CAN2"]);

        let report = commands::generate::execute(&project, false).unwrap();
        assert!(!report.has_failures(), "{report}");
        let can_file = project.dir.join("Modules/can/bsp_can.c");
        let text = std::fs::read_to_string(&can_file).unwrap();
        assert!(text.contains("extern CAN_HandleTypeDef hcan2;"));
        assert!(
            text.contains("HAL_CAN_ActivateNotification(&hcan2, CAN_IT_RX_FIFO1_MSG_PENDING);")
        );

        // Hand edit inside the user region survives regeneration.
        let edited = text.replace(
            "    /* USER CAN INIT BEGIN */\n",
            "    /* USER CAN INIT BEGIN */\n    can_motor_attach(&hcan1);\n",
        );
        std::fs::write(&can_file, &edited).unwrap();

        let report = commands::generate::execute(&project, false).unwrap();
        let can = report.results.iter().find(|r| r.module == "can").unwrap();
        assert_eq!(
            can.outcome,
            Outcome::Generated {
                write: WriteStatus::Unchanged
            }
        );
        assert_eq!(std::fs::read_to_string(&can_file).unwrap(), edited);
    }

    #[test]
    fn disable_keeps_required_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        commands::select::enable(&project, &["can_motor".to_string()]).unwrap();
        let resolution = commands::select::disable(&project, &["can".to_string()]).unwrap();
        assert_eq!(
            resolution.still_required,
            vec![("can".to_string(), vec!["can_motor".to_string()])]
        );
        assert!(selection(&project).is_enabled("can"));

        commands::select::disable(&project, &["can_motor".to_string()]).unwrap();
        let state = selection(&project);
        assert!(!state.is_enabled("can_motor"));
        assert!(state.is_enabled("can"));
        assert!(state.is_enabled("ringbuf"));
    }

    #[test]
    fn enable_unknown_module_leaves_selection_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        let err = commands::select::enable(&project, &["warp_drive".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown module"));
        assert_eq!(selection(&project), SelectionState::new());
    }

    #[test]
    fn instances_and_params_flow_into_generation() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        commands::select::enable(&project, &["can_motor".to_string()]).unwrap();
        commands::select::instances(&project, "can", &["can2".to_string()]).unwrap();
        commands::select::set(&project, "can_motor", "gear_ratio", "12").unwrap();
        let state = selection(&project);
        assert_eq!(state.entry("can").unwrap().instances, vec!["CAN2"]);

        commands::generate::execute(&project, false).unwrap();
        let can = std::fs::read_to_string(project.dir.join("Modules/can/bsp_can.c")).unwrap();
        assert!(can.contains("extern CAN_HandleTypeDef hcan2;"));
        assert!(!can.contains("hcan1"));
        let motor =
            std::fs::read_to_string(project.dir.join("Modules/can_motor/can_motor.h")).unwrap();
        assert!(motor.contains("#define CAN_MOTOR_GEAR_RATIO 12"));
        assert!(motor.contains("ringbuf.h"));
    }

    #[test]
    fn instances_rejects_unavailable_instance() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        let err = commands::select::instances(&project, "can", &["CAN3".to_string()]).unwrap_err();
        assert!(err.to_string().contains("not an available CAN instance"));
        let err =
            commands::select::instances(&project, "ringbuf", &["CAN1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("does not bind hardware instances"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        commands::select::enable(&project, &["ringbuf".to_string()]).unwrap();
        let before = std::fs::read_to_string(project.dir.join(SELECTION_FILE)).unwrap();
        let report = commands::generate::execute(&project, true).unwrap();
        assert!(report.dry_run);
        assert!(!project.dir.join("Modules").exists());
        assert_eq!(
            std::fs::read_to_string(project.dir.join(SELECTION_FILE)).unwrap(),
            before
        );
    }

    #[test]
    fn generate_fails_for_peripheral_without_instances() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());

        let mut state = SelectionState::new();
        state.entry_mut("can").enabled = true;
        state.entry_mut("ringbuf").enabled = true;
        state.save(&project.selection_path()).unwrap();

        let err = commands::generate::run(&project, false, None).unwrap_err();
        assert!(err.to_string().contains("1 target(s) failed"));
        // The other module was still generated.
        assert!(project.dir.join("Modules/ringbuf/ringbuf.h").is_file());
    }

    #[test]
    fn overrides_take_precedence_over_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());
        let cwd = dir.path();
        let overrides = Overrides {
            templates: None,
            output: Some(PathBuf::from("out")),
            config: Some(PathBuf::from("board/board.ioc")),
        };
        let overridden =
            Project::new(project.dir.clone(), project.manifest.clone(), cwd, &overrides);
        assert_eq!(overridden.output_root, cwd.join("out"));
        assert_eq!(overridden.template_root, project.dir.join("templates"));
        assert_eq!(
            overridden.config_path().unwrap(),
            cwd.join("board/board.ioc")
        );
        assert_eq!(
            overridden.hardware().unwrap().mcu_name(),
            Some("STM32F407VGTx")
        );
    }

    #[test]
    fn missing_config_reported() {
        let dir = tempfile::tempdir().unwrap();
        let project = board_project(dir.path());
        std::fs::remove_file(project.dir.join("board.ioc")).unwrap();
        assert!(project.hardware().is_err());
        assert!(commands::generate::execute(&project, false).is_err());
    }
}
