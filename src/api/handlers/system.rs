//! System endpoints: health check and the OpenAPI document.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Server time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Active store backend, `memory` or `postgres`.
    pub store: String,
    /// Live notification connections.
    pub connections: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, store backend and the number of live notification connections. Responds 503 when the database is unreachable.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.store.is_healthy().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: state.store.backend().to_string(),
            connections: state.hub.connection_count().await,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    let router = Router::new().route("/health", get(health_handler));

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route("/api-docs/openapi.json", get(openapi_json));

    router
}

#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::api::openapi::ApiDoc::openapi())
}
