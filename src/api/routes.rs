//! Route definitions for the API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::AppState;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::check_input, handlers::health_check),
    components(schemas(
        crate::api::types::CheckInputRequest,
        crate::api::types::CheckInputResponse,
        crate::api::types::HealthResponse,
        crate::domain::DecisionStatus,
    )),
    tags(
        (name = "check", description = "Input evaluation endpoint"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Promptgate API",
        version = "0.1.0",
        description = "Admission-control gateway that screens untrusted prompts before forwarding them to a local LLM",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/v1/check-input", post(handlers::check_input))
        .route("/v1/health", get(handlers::health_check))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
