//! Sign-up, login and current-role handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RoleResponse, UserResponse,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::error::{ErrorResponse, TaskboardError};

/// `POST /register` — Create a regular account.
///
/// # Errors
///
/// Returns [`TaskboardError`] on validation failure or a taken username
/// or email.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "Auth",
    summary = "Register a new user",
    description = "Creates an account with role `user`. Usernames and emails must be unique; passwords need at least 6 characters.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    state.users.register(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// `POST /login` — Exchange credentials for a session token.
///
/// # Errors
///
/// Returns [`TaskboardError::InvalidCredentials`] on any mismatch.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "Auth",
    summary = "Log in",
    description = "Verifies username and password and returns a bearer token valid for the configured lifetime.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let (user, token) = state.users.login(&req.username, &req.password).await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(&user),
    }))
}

/// `GET /roles` — Role of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "Auth",
    summary = "Current role",
    description = "Returns the role carried by the caller's token.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller role", body = RoleResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn current_role(user: AuthUser) -> Json<RoleResponse> {
    Json(RoleResponse { role: user.role })
}

/// Unauthenticated routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes requiring a session.
pub fn routes() -> Router<AppState> {
    Router::new().route("/roles", get(current_role))
}
