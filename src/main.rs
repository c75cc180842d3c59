//! agentpipe - Command-line entry point
//!
//! Runs one natural-language query through the task-routing pipeline and
//! prints the final (possibly redacted) response.

use agentpipe::agents::{CapabilityRegistry, ContextBag, EdaAgent, ForecastingAgent};
use agentpipe::config::PipelineConfig;
use agentpipe::observability::init_default_logging;
use agentpipe::pipeline::Orchestrator;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Resilient task-routing pipeline for analytics agents
#[derive(Parser)]
#[command(name = "agentpipe")]
#[command(about = "Route a natural-language request to an analytics agent")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one query through the pipeline
    Query {
        /// The natural-language request
        query: String,
        /// Request context as a JSON object (e.g. '{"sales_history": [1,2,3]}')
        #[arg(long, value_name = "JSON")]
        context: Option<String>,
        /// Overall deadline in seconds for the whole request
        #[arg(long, value_name = "SECS")]
        deadline: Option<u64>,
    },
    /// Validate configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Query {
            query,
            context,
            deadline,
        } => run_query(config, &query, context.as_deref(), deadline).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_file(path)?)
        }
        None => {
            info!("Using default configuration");
            Ok(PipelineConfig::default())
        }
    }
}

async fn run_query(
    config: PipelineConfig,
    query: &str,
    context_json: Option<&str>,
    deadline_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let context: ContextBag = match context_json {
        Some(raw) => serde_json::from_str(raw)?,
        None => ContextBag::new(),
    };

    let registry = CapabilityRegistry::builder()
        .register("eda", Arc::new(EdaAgent::new()))
        .register("forecast", Arc::new(ForecastingAgent::new()))
        .build();
    let orchestrator = Orchestrator::new(&config, registry);

    let outcome = match deadline_secs {
        Some(secs) => {
            orchestrator
                .submit_with_deadline(query, context, Duration::from_secs(secs))
                .await
        }
        None => orchestrator.submit(query, context).await,
    };

    match outcome {
        Ok(response) => {
            println!("{response}");
            Ok(())
        }
        Err(e) => {
            // Log the detail; the caller only sees the generic message
            error!("Pipeline failure: {}", e);
            println!("{}", e.user_message());
            process::exit(1);
        }
    }
}

fn handle_config_command(
    config: PipelineConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    println!("Configuration is valid");
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
