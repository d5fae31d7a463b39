//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to the notification channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let hub = state.hub.clone();

    ws.on_failed_upgrade(|err| {
        tracing::warn!(error = %err, "ws upgrade failed");
    })
    .on_upgrade(move |socket| run_connection(socket, hub))
}
