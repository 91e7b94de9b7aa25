//! HTTP route handlers for the API.

use crate::AppState;
use crate::state::{Admission, Claim};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use copilot_common::{AnalysisRequest, AnalysisResponse, CopilotError};
use copilot_orchestrator::ProgressState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code,
            details: None,
        }
    }

    fn at_capacity() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "AT_CAPACITY",
            "Too many analyses running, retry later",
        )
    }

    fn not_found(request_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No analysis with id {request_id}"),
        )
    }
}

impl From<CopilotError> for ErrorResponse {
    fn from(err: CopilotError) -> Self {
        match err {
            CopilotError::InvalidRequest(message) => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
            }
            CopilotError::AllAgentsFailed {
                ref crm_info,
                ref customer_story,
                ref engineer_feedback,
            } => Self {
                status: StatusCode::BAD_GATEWAY,
                error: err.to_string(),
                code: "ALL_AGENTS_FAILED",
                details: Some(serde_json::json!({
                    "crm_info": crm_info,
                    "customer_story": customer_story,
                    "engineering_feedback": engineer_feedback,
                })),
            },
            other => {
                error!(error = %other, "Analysis failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, "INVALID_REQUEST", rejection.body_text())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Analyze a transcript and wait for the report.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ErrorResponse> {
    let Json(request) = payload?;
    debug!(
        transcript_len = request.transcript.len(),
        encoding = ?request.encoding,
        "Received analysis request"
    );

    let orchestrator = &state.orchestrator;
    let report = orchestrator
        .analyze(&request, orchestrator.deadline())
        .await?;

    Ok(Json(report.to_response()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub request_id: String,
}

/// Start an analysis in the background.
pub async fn start_analysis(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartResponse>), ErrorResponse> {
    let Json(request) = payload?;

    let Admission::Started(request_id) = state.start(&request).await? else {
        return Err(ErrorResponse::at_capacity());
    };

    info!(request_id = %request_id, "Analysis started");
    Ok((StatusCode::ACCEPTED, Json(StartResponse { request_id })))
}

pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<ProgressState>, ErrorResponse> {
    state
        .progress(&request_id)
        .await
        .map(Json)
        .ok_or_else(|| ErrorResponse::not_found(&request_id))
}

/// Body returned while an analysis is still running.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingResponse {
    pub request_id: String,
    pub status: String,
    pub progress: ProgressState,
}

/// Fetch an analysis: 202 with progress while running, the report once done.
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Response, ErrorResponse> {
    match state.claim(&request_id).await {
        None => Err(ErrorResponse::not_found(&request_id)),
        Some(Claim::Running(progress)) => Ok((
            StatusCode::ACCEPTED,
            Json(PendingResponse {
                request_id,
                status: "running".into(),
                progress,
            }),
        )
            .into_response()),
        Some(Claim::Finished(handle)) => match handle.join().await {
            Ok(report) => Ok(Json(report.to_response()).into_response()),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Analysis finished with error");
                Err(e.into())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_common::{ErrorKind, FailureCause};

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
            uptime_seconds: 100,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("uptime_seconds"));
    }

    #[test]
    fn test_invalid_request_maps_to_400() {
        let response = ErrorResponse::from(CopilotError::InvalidRequest(
            "Transcript cannot be empty".into(),
        ));
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.code, "INVALID_REQUEST");
        assert!(response.details.is_none());
    }

    #[test]
    fn test_all_agents_failed_maps_to_502_with_causes() {
        let response = ErrorResponse::from(CopilotError::AllAgentsFailed {
            crm_info: FailureCause::new(ErrorKind::LookupError, "crm down"),
            customer_story: FailureCause::timed_out(),
            engineer_feedback: FailureCause::new(ErrorKind::Rejected, "filtered"),
        });
        assert_eq!(response.status, StatusCode::BAD_GATEWAY);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["details"]["customer_story"]["kind"], "timed_out");
        assert_eq!(json["details"]["engineering_feedback"]["message"], "filtered");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_at_capacity_maps_to_503() {
        let response = ErrorResponse::at_capacity();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.code, "AT_CAPACITY");
    }
}
