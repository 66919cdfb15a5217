use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stashd::core::{Pipeline, Scheduler, notifications};
use stashd::{config, context, logging};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "stashd")]
#[command(about = "Scheduled directory backup daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[arg(long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduled backup loop in the foreground
    Daemon,
    /// Run a single backup pass and exit
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(logging::LogConfig {
        json: cli.json_logs,
        verbose: cli.verbose,
    });
    info!("starting stashd");

    let config = config::AppConfig::load(&cli.config)?;
    let notifier = notifications::create_notifier(&config.dingtalk);
    let ctx = context::AppContext::new(config, notifier);

    match cli.command {
        Commands::Daemon => Scheduler::new(ctx)?
            .start()
            .await
            .context("backup scheduler stopped")?,
        Commands::Run => Pipeline::new(ctx).run().await,
    }

    Ok(())
}
