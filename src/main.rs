use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use vault_sync::config::SyncConfig;
use vault_sync::logger;
use vault_sync::planner::SyncPlanner;
use vault_sync::report::{self, ReportFormat};

#[derive(Parser)]
#[command(name = "vault-sync")]
#[command(about = "Plan-only reconciliation of two Bitwarden-compatible vaults", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the dry-run sync plan (create/update/delete) between the
    /// source and destination vaults
    Plan {
        /// Path to a config file (default: platform config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: console, json, or markdown
        #[arg(short, long, default_value = "console")]
        format: String,

        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comparison worker pool width (overrides config)
        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Inspect planner configuration
    Config {
        /// Path to a config file (default: platform config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show the effective configuration with secrets masked
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    logger::init_logger()?;
    logger::rotate_log_if_needed()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            config,
            format,
            output,
            max_workers,
        } => {
            let format: ReportFormat = format.parse()?;
            run_plan(config.as_deref(), format, output.as_deref(), max_workers)?;
        }
        Commands::Config { config, show } => {
            if show {
                let settings = SyncConfig::load(config.as_deref())?;
                println!("{}", settings.masked()?);
            } else {
                let path = match config {
                    Some(p) => p,
                    None => vault_sync::config::ConfigManager::config_file_path()?,
                };
                let state = if path.exists() { "present" } else { "absent" };
                println!("Config file: {} ({state})", path.display());
                println!("Run 'vault-sync config --show' to print the effective settings");
            }
        }
    }

    Ok(())
}

fn run_plan(
    config_path: Option<&std::path::Path>,
    format: ReportFormat,
    output: Option<&std::path::Path>,
    max_workers: Option<usize>,
) -> Result<()> {
    let settings = SyncConfig::load(config_path).context("Failed to load configuration")?;
    let workers = max_workers.unwrap_or(settings.max_workers);

    log::info!("Connecting to source vault");
    let source = settings.source.connect("source")?;

    log::info!("Connecting to destination vault");
    let destination = settings.destination.connect("destination")?;

    let planner = SyncPlanner::with_workers(Box::new(source), Box::new(destination), workers)?;
    let plan = planner.plan()?;

    report::emit(&plan, format, output)
}
