//! Task template handlers, including task instantiation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateTemplateRequest, MessageResponse, TaskResponse, TemplateListResponse, TemplateResponse,
    UpdateTemplateRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{TemplateId, UserId};
use crate::error::{ErrorResponse, TaskboardError};

/// `POST /templates` — Create a template owned by the caller.
///
/// # Errors
///
/// Returns [`TaskboardError::InvalidRequest`] on validation failure.
#[utoipa::path(
    post,
    path = "/api/v1/templates",
    tag = "Templates",
    summary = "Create a template",
    security(("bearer_auth" = [])),
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
    )
)]
pub async fn create_template(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let template = state.templates.create_template(&actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(TemplateResponse::from(template))))
}

/// `GET /templates` — Admins get every template, users their own.
///
/// # Errors
///
/// Returns [`TaskboardError`] on persistence failure.
#[utoipa::path(
    get,
    path = "/api/v1/templates",
    tag = "Templates",
    summary = "List templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Template list", body = TemplateListResponse),
    )
)]
pub async fn list_templates(
    State(state): State<AppState>,
    actor: AuthUser,
) -> Result<impl IntoResponse, TaskboardError> {
    let templates = state.templates.list_templates(&actor).await?;
    Ok(Json(TemplateListResponse::from(templates)))
}

/// `GET /templates/owner/{owner_id}` — Templates of one owner.
///
/// # Errors
///
/// Returns [`TaskboardError`] on persistence failure.
#[utoipa::path(
    get,
    path = "/api/v1/templates/owner/{owner_id}",
    tag = "Templates",
    summary = "List templates by owner",
    security(("bearer_auth" = [])),
    params(
        ("owner_id" = i64, Path, description = "Owner user id"),
    ),
    responses(
        (status = 200, description = "Template list", body = TemplateListResponse),
    )
)]
pub async fn list_templates_by_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<UserId>,
) -> Result<impl IntoResponse, TaskboardError> {
    let templates = state.templates.list_templates_by_owner(owner_id).await?;
    Ok(Json(TemplateListResponse::from(templates)))
}

/// `GET /templates/{id}` — Fetch one template.
///
/// # Errors
///
/// Returns [`TaskboardError::TemplateNotFound`] if absent.
#[utoipa::path(
    get,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    summary = "Get a template",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template id"),
    ),
    responses(
        (status = 200, description = "Template", body = TemplateResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
    )
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
) -> Result<impl IntoResponse, TaskboardError> {
    let template = state.templates.get_template(id).await?;
    Ok(Json(TemplateResponse::from(template)))
}

/// `PUT /templates/{id}` — Edit a template.
///
/// # Errors
///
/// Returns [`TaskboardError`] when absent, not owned by the caller, or
/// invalid.
#[utoipa::path(
    put,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    summary = "Update a template",
    description = "Allowed for the owner and admins. Publishes `task template updated`.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template id"),
    ),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
    )
)]
pub async fn update_template(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TemplateId>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let template = state
        .templates
        .update_template(&actor, id, req.into())
        .await?;
    Ok(Json(TemplateResponse::from(template)))
}

/// `DELETE /templates/{id}` — Delete a template.
///
/// # Errors
///
/// Returns [`TaskboardError`] when absent or not owned by the caller.
#[utoipa::path(
    delete,
    path = "/api/v1/templates/{id}",
    tag = "Templates",
    summary = "Delete a template",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template id"),
    ),
    responses(
        (status = 200, description = "Template deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
    )
)]
pub async fn delete_template(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TemplateId>,
) -> Result<impl IntoResponse, TaskboardError> {
    state.templates.delete_template(&actor, id).await?;
    Ok(Json(MessageResponse::new("Task template deleted successfully")))
}

/// `POST /templates/{id}/tasks` — Instantiate a task from a template.
///
/// # Errors
///
/// Returns [`TaskboardError::TemplateNotFound`] if absent.
#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/tasks",
    tag = "Templates",
    summary = "Create a task from a template",
    description = "The new task is pending, owned by and assigned to the caller, and due after the template's default duration.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Template id"),
    ),
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 404, description = "Template not found", body = ErrorResponse),
    )
)]
pub async fn create_task_from_template(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TemplateId>,
) -> Result<impl IntoResponse, TaskboardError> {
    let details = state.templates.create_task_from_template(&actor, id).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(details))))
}

/// Template routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/templates/owner/{owner_id}", get(list_templates_by_owner))
        .route("/templates/{id}/tasks", post(create_task_from_template))
}
