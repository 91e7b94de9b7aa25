//! HTTP API for the sales copilot.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /analyze`, `POST /api/v1/analyze` - Analyze and wait for the report
//! - `POST /api/v1/analyses` - Start an analysis in the background (503 at capacity)
//! - `GET /api/v1/analyses/{id}/progress` - Per-agent progress flags
//! - `GET /api/v1/analyses/{id}` - Progress while running, the report once done
//!
//! # Architecture
//!
//! ```text
//! Client
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   API Gateway   │ ◄── This crate
//! │     (Axum)      │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │  Orchestrator   │
//! └────────┬────────┘
//!          ├──────────────────┬──────────────────┐
//!          ▼                  ▼                  ▼
//!     CRM Info          Customer Story    Engineer Feedback
//! ```

pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use copilot_common::MAX_REQUEST_BYTES;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use state::{Admission, AppState, Claim};

// Room for JSON framing around the largest accepted payload.
const BODY_LIMIT: usize = MAX_REQUEST_BYTES + 64 * 1024;

fn cors_layer(origins: Option<Vec<String>>) -> CorsLayer {
    let allow_origin = match origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(origin = %o, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>, cors_origins: Option<Vec<String>>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/analyze", post(routes::analyze))
        .route("/api/v1/analyze", post(routes::analyze))
        .route("/api/v1/analyses", post(routes::start_analysis))
        .route("/api/v1/analyses/{id}", get(routes::get_analysis))
        .route("/api/v1/analyses/{id}/progress", get(routes::get_progress))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    cors_origins: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let router = create_router(state, cors_origins);

    info!(%addr, "Starting sales copilot API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
