//! Tasks: creation, visibility-filtered listing, edits and deletion.

use std::sync::Arc;

use crate::auth::AuthUser;
use crate::domain::notification::TaskSnapshot;
use crate::domain::task::{parse_due_date, parse_status_filter};
use crate::domain::{
    NewTask, Notification, SortOrder, Task, TaskId, TaskQuery, TaskSortField, TaskStatus, User,
    UserId,
};
use crate::error::TaskboardError;
use crate::persistence::Store;
use crate::ws::Hub;

use super::{non_blank, notify};

/// Fields accepted when creating a task.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    /// Required title.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional deadline in one of the accepted layouts.
    pub due_date: Option<String>,
    /// Optional initial status; defaults to `pending`.
    pub status: Option<String>,
    /// Optional priority label.
    pub priority: Option<String>,
    /// Optional tag list.
    pub tags: Option<String>,
    /// Initial assignees.
    pub assignee_ids: Vec<UserId>,
}

/// Partial task update. `None` or blank fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
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
    /// New owner; honoured for administrators only.
    pub owner_id: Option<UserId>,
    /// Replacement assignee set; an empty list leaves it unchanged.
    pub assignee_ids: Option<Vec<UserId>>,
}

/// Raw list parameters as received from the query string.
#[derive(Debug, Clone, Default)]
pub struct TaskListParams {
    /// Comma-separated statuses.
    pub status: Option<String>,
    /// `name` or `due_date`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
}

/// A task with its owner and assignees resolved.
#[derive(Debug, Clone)]
pub struct TaskDetails {
    /// The task itself.
    pub task: Task,
    /// Owner account, if it still exists.
    pub owner: Option<User>,
    /// Assignee accounts, ascending by id.
    pub assignees: Vec<User>,
}

/// Task operations.
#[derive(Debug, Clone)]
pub struct TaskService {
    store: Arc<Store>,
    hub: Hub,
}

impl TaskService {
    /// Creates a new `TaskService`.
    #[must_use]
    pub fn new(store: Arc<Store>, hub: Hub) -> Self {
        Self { store, hub }
    }

    /// Creates a task owned by `actor`.
    ///
    /// # Errors
    ///
    /// Validation errors for the name, status, due date or an unknown
    /// assignee.
    pub async fn create_task(
        &self,
        actor: &AuthUser,
        input: TaskInput,
    ) -> Result<TaskDetails, TaskboardError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TaskboardError::InvalidRequest("name is required".to_string()));
        }
        let status = match non_blank(input.status) {
            Some(raw) => raw.parse::<TaskStatus>()?,
            None => TaskStatus::default(),
        };
        let due_date = non_blank(input.due_date)
            .map(|raw| parse_due_date(&raw))
            .transpose()?;
        self.check_assignees(&input.assignee_ids).await?;

        let task = self
            .store
            .insert_task(NewTask {
                name,
                description: input.description.unwrap_or_default(),
                due_date,
                status,
                priority: input.priority.unwrap_or_default(),
                tags: input.tags.unwrap_or_default(),
                owner_id: actor.user_id,
                assignee_ids: input.assignee_ids,
            })
            .await?;

        tracing::info!(task_id = %task.id, owner_id = %task.owner_id, "task created");
        notify(&self.hub, Notification::TaskCreated { task_id: task.id }).await;
        self.details(task).await
    }

    /// Lists tasks visible to `actor`, filtered and ordered per `params`.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::InvalidRequest`] for an unknown status, sort field
    /// or order.
    pub async fn list_tasks(
        &self,
        actor: &AuthUser,
        params: TaskListParams,
    ) -> Result<Vec<TaskDetails>, TaskboardError> {
        let statuses = match params.status {
            Some(raw) => parse_status_filter(&raw)?,
            None => Vec::new(),
        };
        let sort_by = non_blank(params.sort_by)
            .map(|raw| raw.parse::<TaskSortField>())
            .transpose()?;
        let order = non_blank(params.order)
            .map(|raw| raw.parse::<SortOrder>())
            .transpose()?
            .unwrap_or_default();

        let query = TaskQuery {
            statuses,
            visible_to: (!actor.is_admin()).then_some(actor.user_id),
            sort_by,
            order,
        };
        let tasks = self.store.list_tasks(&query).await?;

        let mut out = Vec::with_capacity(tasks.len());
        for task in tasks {
            out.push(self.details(task).await?);
        }
        Ok(out)
    }

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TaskNotFound`] if absent, [`TaskboardError::Forbidden`]
    /// unless the actor owns it, is assigned to it, or is an admin.
    pub async fn get_task(&self, actor: &AuthUser, id: TaskId) -> Result<TaskDetails, TaskboardError> {
        let task = self.load(id).await?;
        if !actor.is_admin() && !task.involves(actor.user_id) {
            return Err(TaskboardError::Forbidden(
                "you are not allowed to view this task".to_string(),
            ));
        }
        self.details(task).await
    }

    /// Applies `changes` to a task.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::Forbidden`] unless the actor owns, is assigned to,
    /// or administers the task; validation errors for bad fields.
    pub async fn update_task(
        &self,
        actor: &AuthUser,
        id: TaskId,
        changes: TaskChanges,
    ) -> Result<TaskDetails, TaskboardError> {
        let mut task = self.load(id).await?;
        if !actor.is_admin() && !task.involves(actor.user_id) {
            return Err(TaskboardError::Forbidden(
                "you are not allowed to update this task".to_string(),
            ));
        }

        if let Some(name) = non_blank(changes.name) {
            task.name = name;
        }
        if let Some(description) = changes.description.filter(|d| !d.is_empty()) {
            task.description = description;
        }
        if let Some(raw) = non_blank(changes.due_date) {
            task.due_date = Some(parse_due_date(&raw)?);
        }
        if let Some(raw) = non_blank(changes.status) {
            task.status = raw.parse::<TaskStatus>()?;
        }
        if let Some(priority) = changes.priority.filter(|p| !p.is_empty()) {
            task.priority = priority;
        }
        if let Some(tags) = changes.tags.filter(|t| !t.is_empty()) {
            task.tags = tags;
        }
        if let Some(owner_id) = changes.owner_id
            && actor.is_admin()
            && owner_id != task.owner_id
        {
            if self.store.user_by_id(owner_id).await?.is_none() {
                return Err(TaskboardError::InvalidRequest("invalid new owner id".to_string()));
            }
            task.owner_id = owner_id;
        }
        if let Some(assignees) = changes.assignee_ids.filter(|a| !a.is_empty()) {
            self.check_assignees(&assignees).await?;
            task.assignee_ids = assignees;
        }

        let task = self.store.update_task(&task).await?;
        tracing::info!(task_id = %task.id, actor = %actor.user_id, "task updated");
        notify(
            &self.hub,
            Notification::TaskUpdated {
                task: TaskSnapshot::from(&task),
            },
        )
        .await;
        self.details(task).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TaskNotFound`] if absent, [`TaskboardError::Forbidden`]
    /// unless the actor owns the task or is an admin.
    pub async fn delete_task(&self, actor: &AuthUser, id: TaskId) -> Result<(), TaskboardError> {
        let task = self.load(id).await?;
        if !actor.is_admin() && task.owner_id != actor.user_id {
            return Err(TaskboardError::Forbidden(
                "only the owner may delete this task".to_string(),
            ));
        }
        if !self.store.delete_task(id).await? {
            return Err(TaskboardError::TaskNotFound(id.get()));
        }
        tracing::info!(task_id = %id, actor = %actor.user_id, "task deleted");
        notify(&self.hub, Notification::TaskDeleted { task_id: id }).await;
        Ok(())
    }

    async fn load(&self, id: TaskId) -> Result<Task, TaskboardError> {
        self.store
            .task_by_id(id)
            .await?
            .ok_or(TaskboardError::TaskNotFound(id.get()))
    }

    async fn check_assignees(&self, ids: &[UserId]) -> Result<(), TaskboardError> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self.store.users_by_ids(ids).await?;
        let all_exist = ids.iter().all(|id| found.iter().any(|u| u.id == *id));
        if all_exist {
            Ok(())
        } else {
            Err(TaskboardError::InvalidRequest("invalid assignee id".to_string()))
        }
    }

    pub(crate) async fn details(&self, task: Task) -> Result<TaskDetails, TaskboardError> {
        let owner = self.store.user_by_id(task.owner_id).await?;
        let assignees = self.store.users_by_ids(&task.assignee_ids).await?;
        Ok(TaskDetails {
            task,
            owner,
            assignees,
        })
    }
}
