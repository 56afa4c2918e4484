//! StructRAG CLI
//!
//! Structure-aware question answering over local fragment snapshots.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, IndexesCommand, SearchCommand, TemplatesCommand};
use std::path::PathBuf;
use structrag_core::{config::AppConfig, logging, AppError};

/// StructRAG CLI - structure-aware retrieval-augmented answering
#[derive(Parser, Debug)]
#[command(name = "structrag")]
#[command(about = "Structure-aware retrieval-augmented answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "STRUCTRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "STRUCTRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama)
    #[arg(short, long, global = true, env = "STRUCTRAG_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "STRUCTRAG_MODEL")]
    model: Option<String>,

    /// Provider endpoint URL
    #[arg(long, global = true, env = "STRUCTRAG_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from an index
    Ask(AskCommand),

    /// Find citations for a query without generating an answer
    Search(SearchCommand),

    /// List the available indexes
    Indexes(IndexesCommand),

    /// List and validate the loaded prompt templates
    Templates(TemplatesCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace, cli.config)
        .context("Failed to load configuration")?;

    // Apply CLI overrides
    let config = config.with_overrides(
        None,
        cli.provider,
        cli.model,
        cli.endpoint,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("StructRAG CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Indexes(_) => "indexes",
        Commands::Templates(_) => "templates",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Indexes(cmd) => cmd.execute(&config).await,
        Commands::Templates(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) if is_cancelled(e) => tracing::warn!("Command cancelled"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}

fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AppError>()
        .is_some_and(AppError::is_cancelled)
}
