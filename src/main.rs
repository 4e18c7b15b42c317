use anyhow::Context;
use clap::Parser;
use configuration::{Config, LogFormat, load_config};
use core_types::demo_catalog;
use database::{DbRepository, connect, run_migrations};
use engine::{DemoRunner, SqlDemoEngine};
use std::path::PathBuf;
use std::process::ExitCode;

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Interactive demos of query performance patterns against PostgreSQL.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Exit with a non-zero status when a demo fails, instead of logging and exiting cleanly.
    #[arg(long)]
    strict_exit: bool,

    /// Overrides `logging.format` from the configuration.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

/// The main entry point for the demo runner.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; DATABASE_URL may come from the environment or config.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Held until the end of main so the file writer flushes.
    let _log_guard = match configuration::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting Demo Runner");
    match run(config).await {
        Ok(()) => {
            tracing::info!("Demo Runner Exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "Unknown error");
            if cli.strict_exit {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

// ==============================================================================
// Composition Root
// ==============================================================================

/// Builds the pool, repository, engine and runner explicitly, then runs the loop on stdin/stdout.
async fn run(config: Config) -> anyhow::Result<()> {
    let pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let catalog = demo_catalog();
    if let Err(e) = catalog.require_labels() {
        tracing::warn!(error = %e, "Command catalog is incomplete; falling back to identifiers");
    }

    let engine = SqlDemoEngine::new(DbRepository::new(pool), config.demo);
    let runner = DemoRunner::new(engine, catalog);

    let stdin = std::io::stdin();
    runner.run(stdin.lock(), std::io::stdout()).await?;
    Ok(())
}
