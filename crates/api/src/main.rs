//! Sales copilot API server binary.
//!
//! Usage:
//!   copilot-api --config copilot.toml
//!   copilot-api --port 8080 --bind 0.0.0.0
//!
//! Every flag can also be set through its `COPILOT_*` environment variable.
//! Collaborator keys are read from `OPENAI_API_KEY` / `AZURE_OPENAI_API_KEY`,
//! `SEARCH_API_KEY`, and `CRM_API_KEY` when absent from the config file.

use clap::Parser;
use copilot_api::{AppState, serve};
use copilot_orchestrator::OrchestratorConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "copilot-api", version, about = "Sales copilot analysis API server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "COPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "COPILOT_PORT", default_value_t = 8080)]
    port: u16,

    /// Bind address
    #[arg(short, long, env = "COPILOT_BIND_ADDR", default_value = "127.0.0.1")]
    bind: String,

    /// Allowed CORS origins (comma-separated); any origin when unset
    #[arg(long, env = "COPILOT_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Option<Vec<String>>,

    /// Seconds an unclaimed background result is kept
    #[arg(long, env = "COPILOT_RESULT_TTL_SECS", default_value_t = 600)]
    result_ttl_secs: u64,

    /// Background analyses allowed in flight at once
    #[arg(long, env = "COPILOT_MAX_RUNNING", default_value_t = 64)]
    max_running: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,copilot_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.bind == "0.0.0.0" {
        tracing::warn!(
            "Server binding to 0.0.0.0. This exposes the API to all network interfaces; \
             make sure a firewall or gateway is in front of it."
        );
    }

    let config = match args.config {
        Some(ref path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            OrchestratorConfig::from_file(path)?
        }
        None => {
            tracing::info!("Using default configuration");
            OrchestratorConfig::default()
        }
    };

    let state = AppState::from_config(&config)?
        .with_result_ttl(Duration::from_secs(args.result_ttl_secs))
        .with_max_running(args.max_running);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    serve(Arc::new(state), addr, args.cors_origins).await?;

    Ok(())
}
