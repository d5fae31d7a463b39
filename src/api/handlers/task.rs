//! Task handlers: create, list, get, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    CreateTaskRequest, MessageResponse, TaskListQuery, TaskResponse, UpdateTaskRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::TaskId;
use crate::error::{ErrorResponse, TaskboardError};

/// `POST /tasks` — Create a task owned by the caller.
///
/// # Errors
///
/// Returns [`TaskboardError`] on validation failure or an unknown assignee.
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "Tasks",
    summary = "Create a task",
    description = "Creates a task owned by the caller and publishes `new task created`.",
    security(("bearer_auth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let details = state.tasks.create_task(&actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(details))))
}

/// `GET /tasks` — List visible tasks.
///
/// # Errors
///
/// Returns [`TaskboardError::InvalidRequest`] for bad filter or sort values.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "Tasks",
    summary = "List tasks",
    description = "Admins see all tasks; other users see tasks they own or are assigned to. Filter by comma-separated `status`, order by `sort_by` (`name`, `due_date`) and `order` (`asc`, `desc`).",
    security(("bearer_auth" = [])),
    params(TaskListQuery),
    responses(
        (status = 200, description = "Task list", body = Vec<TaskResponse>),
        (status = 400, description = "Invalid status, sort_by or order", body = ErrorResponse),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    actor: AuthUser,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, TaskboardError> {
    let tasks = state.tasks.list_tasks(&actor, query.into()).await?;
    let body: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(Json(body))
}

/// `GET /tasks/{id}` — Fetch one task.
///
/// # Errors
///
/// Returns [`TaskboardError::TaskNotFound`] or [`TaskboardError::Forbidden`].
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    summary = "Get a task",
    description = "Visible to the owner, assignees and admins.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Task id"),
    ),
    responses(
        (status = 200, description = "Task", body = TaskResponse),
        (status = 403, description = "Not visible to caller", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TaskId>,
) -> Result<impl IntoResponse, TaskboardError> {
    let details = state.tasks.get_task(&actor, id).await?;
    Ok(Json(TaskResponse::from(details)))
}

/// `PUT /tasks/{id}` — Edit a task.
///
/// # Errors
///
/// Returns [`TaskboardError`] when the caller may not edit the task or a
/// field is invalid.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    summary = "Update a task",
    description = "Allowed for the owner, assignees and admins. Only admins may transfer ownership. Publishes `task updated`.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Task id"),
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TaskId>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, TaskboardError> {
    let details = state.tasks.update_task(&actor, id, req.into()).await?;
    Ok(Json(TaskResponse::from(details)))
}

/// `DELETE /tasks/{id}` — Delete a task.
///
/// # Errors
///
/// Returns [`TaskboardError::TaskNotFound`] or [`TaskboardError::Forbidden`].
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    tag = "Tasks",
    summary = "Delete a task",
    description = "Allowed for the owner and admins. Publishes `task deleted`.",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Task id"),
    ),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<TaskId>,
) -> Result<impl IntoResponse, TaskboardError> {
    state.tasks.delete_task(&actor, id).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}

/// Task routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
