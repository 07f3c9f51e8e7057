mod registered_modules;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::RunMode;
use modkit::bootstrap::{AppConfig, init_logging, run_server};

use std::path::PathBuf;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Beacon Server - advertises process liveness through ZooKeeper
#[derive(Parser)]
#[command(name = "beacon-server")]
#[command(about = "Beacon Server - advertises process liveness through ZooKeeper")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit without contacting ZooKeeper
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    // Also normalizes + creates server.home_dir.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.logging, &config.server.home_dir);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Beacon Server starting");

    let registry = registered_modules::build_registry()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, registry, RunMode::Serve).await,
        Commands::Check => {
            run_server(config, registry, RunMode::Check).await?;
            println!("Configuration is valid");
            Ok(())
        }
    }
}
