//! Task DTOs for create, update, list and get.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::user_dto::UserResponse;
use crate::domain::{TaskId, TaskStatus, UserId};
use crate::service::{TaskChanges, TaskDetails, TaskInput, TaskListParams};

/// Request body for `POST /tasks`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Required title.
    #[serde(default)]
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
    pub due_date: Option<String>,
    /// `pending` (default), `in_progress` or `completed`.
    pub status: Option<String>,
    /// Free-form priority label.
    pub priority: Option<String>,
    /// Free-form tag list.
    pub tags: Option<String>,
    /// Users to assign.
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
}

impl From<CreateTaskRequest> for TaskInput {
    fn from(req: CreateTaskRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
            priority: req.priority,
            tags: req.tags,
            assignee_ids: req.assignee_ids,
        }
    }
}

/// Request body for `PUT /tasks/{id}`. Omitted or empty fields are left
/// unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    /// New title.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New deadline.
    pub due_date: Option<String>,
    /// New status.
    pub status: Option<String>,
    /// New priority label.
    pub priority: Option<String>,
    /// New tag list.
    pub tags: Option<String>,
    /// New owner; ignored unless the caller is an admin.
    pub owner_id: Option<UserId>,
    /// Replacement assignee set.
    pub assignee_ids: Option<Vec<UserId>>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(req: UpdateTaskRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
            priority: req.priority,
            tags: req.tags,
            owner_id: req.owner_id,
            assignee_ids: req.assignee_ids,
        }
    }
}

/// Query parameters for `GET /tasks`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    /// Comma-separated statuses, case-insensitive.
    pub status: Option<String>,
    /// `name` or `due_date`. Defaults to id order.
    pub sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    pub order: Option<String>,
}

impl From<TaskListQuery> for TaskListParams {
    fn from(query: TaskListQuery) -> Self {
        Self {
            status: query.status,
            sort_by: query.sort_by,
            order: query.order,
        }
    }
}

/// A task with its owner and assignees.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    /// Task id.
    pub id: TaskId,
    /// Title.
    pub name: String,
    /// Description.
    pub description: String,
    /// Deadline, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Workflow state.
    pub status: TaskStatus,
    /// Priority label.
    pub priority: String,
    /// Tag list.
    pub tags: String,
    /// Owner id.
    pub owner_id: UserId,
    /// Owner account.
    pub owner: Option<UserResponse>,
    /// Assigned accounts.
    pub assignees: Vec<UserResponse>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<TaskDetails> for TaskResponse {
    fn from(details: TaskDetails) -> Self {
        let TaskDetails {
            task,
            owner,
            assignees,
        } = details;
        Self {
            id: task.id,
            name: task.name,
            description: task.description,
            due_date: task.due_date,
            status: task.status,
            priority: task.priority,
            tags: task.tags,
            owner_id: task.owner_id,
            owner: owner.as_ref().map(UserResponse::from),
            assignees: assignees.iter().map(UserResponse::from).collect(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}
