//! Credit-control server answering every CCR it receives.

use anyhow::{Context, Result};
use clap::Parser;
use dcca_config::{load_config, ServerSettings};
use dcca_logging::LogFormat;
use dcca_runtime::CreditControlServer;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "dcca-server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diameter Credit-Control server", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, default_value = "config/server.yaml")]
    config: String,

    /// Log output format (json, text)
    #[arg(long, default_value = "json")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Server failed");
            eprintln!("dcca-server: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let settings: ServerSettings = load_config(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    dcca_logging::init_with_level(&settings.log_level, args.log_format);
    dcca_metrics::register_metrics();

    info!(
        service = "dcca-server",
        version = env!("CARGO_PKG_VERSION"),
        "Starting credit-control server"
    );

    let server = CreditControlServer::bind(&settings.listen.address, settings.identity())
        .await
        .with_context(|| format!("failed to bind {}", settings.listen.address))?;

    server
        .serve_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    info!(metrics = %dcca_metrics::gather_metrics(), "Server stopped");
    Ok(())
}
