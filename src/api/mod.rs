//! REST API layer: route handlers, DTOs, and router composition.
//!
//! REST endpoints are mounted under `/api/v1`; `/ws`, `/health` and the
//! OpenAPI document live at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the REST router, without the outer middleware stack.
pub fn build_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes(state))
        .merge(handlers::system::routes())
}

/// Builds the complete application: REST, WebSocket, API docs, tracing,
/// CORS and the per-request timeout.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = build_router(state.clone()).route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}
