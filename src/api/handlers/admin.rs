//! Administrator-only user management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{
    ChangeRoleRequest, CreateUserRequest, MessageResponse, UpdateUserRequest, UserEnvelope,
    UserListResponse, UserResponse,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{Role, UserId};
use crate::error::{ErrorResponse, TaskboardError};
use crate::service::UserChanges;

/// `PUT /admin/role` — Change another user's role.
///
/// # Errors
///
/// Returns [`TaskboardError`] for an unknown role or user, an unchanged
/// role, or an attempt to change one's own role.
#[utoipa::path(
    put,
    path = "/api/v1/admin/role",
    tag = "Admin",
    summary = "Change a user's role",
    description = "Sets `new_role` (`user` or `admin`) on `user_id`. Admins cannot change their own role.",
    security(("bearer_auth" = [])),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MessageResponse),
        (status = 400, description = "Invalid role or role unchanged", body = ErrorResponse),
        (status = 403, description = "Not an admin, or own role", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn change_role(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let role = req.new_role.parse::<Role>()?;
    state.users.change_role(&actor, req.user_id, role).await?;
    Ok(Json(MessageResponse::new("Role changed successfully")))
}

/// `GET /admin/users` — List all users.
///
/// # Errors
///
/// Returns [`TaskboardError`] on persistence failure.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    summary = "List users (admin)",
    description = "Returns every account ascending by id.",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User list", body = UserListResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, TaskboardError> {
    let users = state.users.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// `POST /admin/users` — Create an account with an explicit role.
///
/// # Errors
///
/// Returns [`TaskboardError`] on validation failure or a conflict.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    tag = "Admin",
    summary = "Create a user (admin)",
    description = "Creates an account with the given role and publishes a `user created` notification.",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let (input, role) = req.into_parts()?;
    let user = state.users.create_user(input, role).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            user: UserResponse::from(&user),
        }),
    ))
}

/// `PUT /admin/users/{id}` — Edit an account.
///
/// # Errors
///
/// Returns [`TaskboardError`] on validation failure, conflict, or an
/// unknown user.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}",
    tag = "Admin",
    summary = "Update a user (admin)",
    description = "Changes only the provided fields. Uniqueness and validation rules are re-checked.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User id"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let changes = UserChanges::try_from(req)?;
    let user = state.users.update_user(&actor, id, changes).await?;
    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// `DELETE /admin/users/{id}` — Remove an account and everything it owns.
///
/// # Errors
///
/// Returns [`TaskboardError`] for an unknown user or self-deletion.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    tag = "Admin",
    summary = "Delete a user (admin)",
    description = "Deletes the account together with its tasks and templates and removes it from all assignee lists.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User id"),
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Cannot delete your own account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, TaskboardError> {
    state.users.delete_user(&actor, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Admin routes, mounted under `/admin` behind the admin gate.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/role", put(change_role))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
}
