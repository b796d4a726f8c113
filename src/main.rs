use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use topolab::config_loader;
use topolab::dispatch::{execute_plan, LoggingBackend};
use topolab::orchestrator;

/// Provisioning planner for virtual network-appliance labs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the topology spec YAML file
    #[arg(short, long)]
    spec: PathBuf,

    /// Output directory for the plan and interface registry
    #[arg(short, long, default_value = "plan_output")]
    output: PathBuf,

    /// Seed for MAC address generation; identical seeds reproduce identical plans
    #[arg(long)]
    seed: Option<u64>,

    /// Walk the generated plan through the logging backend after writing it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting topolab provisioning planner");
    info!("Spec file: {:?}", args.spec);
    info!("Output directory: {:?}", args.output);

    // Load and validate the topology spec
    let spec = config_loader::load_spec(&args.spec)?;

    // Compile the plan and write the artifacts
    let (ops, artifacts) = orchestrator::generate_plan_artifacts(&spec, &args.output, args.seed)?;

    if args.dry_run {
        info!("Dry run: walking {} operation(s)", ops.len());
        let mut backend = LoggingBackend::new();
        let report = execute_plan(&ops, &mut backend)?;
        info!("Dry run applied {} operation(s)", report.applied);
    }

    info!("Plan ready for dispatch: {:?}", artifacts.plan_path);

    Ok(())
}
