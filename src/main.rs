use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dangbeon::config::Config;

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(
    name = "dangbeon",
    version,
    about = "Weekend/holiday on-call rotation with Slack swap and reminder commands",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (environment variables only when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the config value
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create next month's weekend/holiday assignments
    Schedule {
        /// Print the plan without writing it
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Run today's reminder (schedules first, then notifies)
    Remind,

    /// Swap two responders' nearest upcoming assignments
    Swap {
        /// First responder name
        first: String,

        /// Second responder name
        second: String,
    },

    /// Show assignments for the next 30 days
    List,

    /// Serve the slash commands over HTTP
    Serve {
        /// Do not run the daily reminder in the background
        #[arg(long, default_value = "false")]
        no_reminder: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    tracing::info!(config = ?cli.config, "dangbeon starting");
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Schedule { dry_run } => {
            tracing::info!(dry_run, "Starting schedule command");
            commands::schedule(&ctx, dry_run).await?;
        }

        Commands::Remind => {
            tracing::info!("Starting remind command");
            commands::remind(&ctx).await?;
        }

        Commands::Swap { first, second } => {
            tracing::info!(first = %first, second = %second, "Starting swap command");
            commands::swap(&ctx, &first, &second).await?;
        }

        Commands::List => {
            tracing::info!("Starting list command");
            commands::list(&ctx).await?;
        }

        Commands::Serve { no_reminder } => {
            tracing::info!(reminder = !no_reminder, "Starting serve command");
            commands::serve(ctx, !no_reminder).await?;
        }
    }

    tracing::info!("dangbeon completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("dangbeon=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("dangbeon={level},warn"))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
