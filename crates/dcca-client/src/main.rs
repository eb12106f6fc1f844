//! Credit-control voice session client.
//!
//! Opens one session towards the configured server, walks it through
//! INITIAL, UPDATE and TERMINATION, and reports the outcome in the exit
//! status: 0 completed, 1 rejected by the server, 2 local failure.

use anyhow::{Context, Result};
use clap::Parser;
use dcca_cc_core::SessionOutcome;
use dcca_config::{load_config, ClientSettings, ConfigError};
use dcca_core::DccaError;
use dcca_logging::LogFormat;
use dcca_runtime::{connect_and_run, log_by_severity, ClientOptions, ErrorSeverity};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "dcca-client")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diameter Credit-Control voice session client", long_about = None)]
struct Args {
    /// Number of UPDATE requests to ask for
    #[arg(default_value_t = 1)]
    updates: u32,

    /// Configuration file path
    #[arg(short = 'c', long, default_value = "config/client.yaml")]
    config: String,

    /// Log output format (json, text)
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(outcome) => {
            info!(?outcome, "Session finished");
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            log_by_severity!(severity(&e), error = %format!("{e:#}"), "Client failed");
            eprintln!("dcca-client: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn severity(e: &anyhow::Error) -> ErrorSeverity {
    if let Some(e) = e.downcast_ref::<DccaError>() {
        e.severity()
    } else if e.downcast_ref::<ConfigError>().is_some() {
        ErrorSeverity::Critical
    } else {
        ErrorSeverity::Error
    }
}

async fn run(args: &Args) -> Result<SessionOutcome> {
    let settings: ClientSettings = load_config(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    dcca_logging::init_with_level(&settings.log_level, args.log_format);
    dcca_metrics::register_metrics();

    info!(
        service = "dcca-client",
        version = env!("CARGO_PKG_VERSION"),
        peer = %settings.peer.address,
        updates = args.updates,
        "Starting credit-control client"
    );

    let options = ClientOptions {
        answer_timeout: settings.peer.answer_timeout(),
        connect_delay: settings.peer.connect_delay(),
    };
    let session = connect_and_run(
        &settings.peer.address,
        Arc::new(settings.session_config()),
        args.updates,
        options,
    );

    tokio::select! {
        outcome = session => outcome.context("credit-control session failed"),
        _ = tokio::signal::ctrl_c() => anyhow::bail!("interrupted"),
    }
}
