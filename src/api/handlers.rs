//! HTTP request handlers.

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::api::types::{CheckInputRequest, CheckInputResponse, HealthResponse};
use crate::error::GatewayResult;
use crate::AppState;

/// Evaluate caller text through the decision pipeline.
///
/// POST /v1/check-input
#[utoipa::path(
    post,
    path = "/v1/check-input",
    request_body = CheckInputRequest,
    responses(
        (status = 200, description = "Evaluation complete", body = CheckInputResponse),
        (status = 400, description = "Empty or missing input"),
        (status = 500, description = "Internal error")
    ),
    tag = "check"
)]
pub async fn check_input(
    State(state): State<AppState>,
    Json(request): Json<CheckInputRequest>,
) -> GatewayResult<Json<CheckInputResponse>> {
    let trace_id = Uuid::new_v4();
    let user_id = request.user_id.as_deref().unwrap_or("anonymous");

    tracing::info!(
        trace_id = %trace_id,
        user_id = %user_id,
        text_len = request.text.len(),
        "evaluating input"
    );

    let decision = state.pipeline.evaluate(&request.text).await?;

    tracing::info!(
        trace_id = %trace_id,
        user_id = %user_id,
        status = %decision.status,
        confidence = ?decision.confidence,
        "evaluation complete"
    );

    Ok(Json(decision.into()))
}

/// Health check endpoint.
///
/// GET /v1/health
#[utoipa::path(
    get,
    path = "/v1/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_status = match state.llm.ping().await {
        Ok(()) => "reachable".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm: llm_status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
