//! User directory for authenticated callers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{UserListResponse, UserResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, TaskboardError};

/// `GET /users` — List all users, e.g. to pick assignees.
///
/// # Errors
///
/// Returns [`TaskboardError`] on persistence failure.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    summary = "List users",
    description = "Returns every account ascending by id. Password hashes are never exposed.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User list", body = UserListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, TaskboardError> {
    let users = state.users.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// User directory routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}
