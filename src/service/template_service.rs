//! Task templates and instantiating tasks from them.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::AuthUser;
use crate::domain::notification::TemplateSnapshot;
use crate::domain::template::MAX_DEFAULT_DURATION_SECS;
use crate::domain::{
    NewTask, NewTaskTemplate, Notification, TaskStatus, TaskTemplate, TemplateId, UserId,
};
use crate::error::TaskboardError;
use crate::persistence::Store;
use crate::ws::Hub;

use super::task_service::{TaskDetails, TaskService};
use super::{non_blank, notify};

const MAX_TEMPLATE_NAME_LEN: usize = 255;

/// Fields accepted when creating a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateInput {
    /// Required name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Default task duration in seconds; zero when omitted.
    pub default_duration_secs: Option<i64>,
}

/// Partial template update. `None` or blank fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New default duration in seconds.
    pub default_duration_secs: Option<i64>,
}

/// Template operations.
#[derive(Debug, Clone)]
pub struct TemplateService {
    store: Arc<Store>,
    hub: Hub,
    tasks: TaskService,
}

impl TemplateService {
    /// Creates a new `TemplateService`. `tasks` resolves the details of
    /// tasks instantiated from templates.
    #[must_use]
    pub fn new(store: Arc<Store>, hub: Hub, tasks: TaskService) -> Self {
        Self { store, hub, tasks }
    }

    /// Creates a template owned by `actor`.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::InvalidRequest`] for a missing or overlong name or a
    /// negative duration.
    pub async fn create_template(
        &self,
        actor: &AuthUser,
        input: TemplateInput,
    ) -> Result<TaskTemplate, TaskboardError> {
        let name = validate_name(&input.name)?;
        let default_duration_secs = validate_duration(input.default_duration_secs.unwrap_or(0))?;

        let template = self
            .store
            .insert_template(NewTaskTemplate {
                name,
                description: input.description.unwrap_or_default(),
                default_duration_secs,
                owner_id: actor.user_id,
            })
            .await?;

        tracing::info!(template_id = %template.id, owner_id = %template.owner_id, "template created");
        notify(
            &self.hub,
            Notification::TemplateCreated {
                template_id: template.id,
            },
        )
        .await;
        Ok(template)
    }

    /// Admins see every template, other users their own.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_templates(&self, actor: &AuthUser) -> Result<Vec<TaskTemplate>, TaskboardError> {
        let owner = (!actor.is_admin()).then_some(actor.user_id);
        self.store.list_templates(owner).await
    }

    /// Templates owned by `owner_id`, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_templates_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<TaskTemplate>, TaskboardError> {
        self.store.list_templates(Some(owner_id)).await
    }

    /// Looks a template up by id.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TemplateNotFound`] if absent.
    pub async fn get_template(&self, id: TemplateId) -> Result<TaskTemplate, TaskboardError> {
        self.store
            .template_by_id(id)
            .await?
            .ok_or(TaskboardError::TemplateNotFound(id.get()))
    }

    /// Applies `changes` to a template.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TemplateNotFound`], [`TaskboardError::Forbidden`]
    /// unless the actor owns it or is an admin, or a validation error.
    pub async fn update_template(
        &self,
        actor: &AuthUser,
        id: TemplateId,
        changes: TemplateChanges,
    ) -> Result<TaskTemplate, TaskboardError> {
        let mut template = self.get_template(id).await?;
        ensure_may_modify(actor, &template)?;

        if let Some(name) = non_blank(changes.name) {
            template.name = validate_name(&name)?;
        }
        if let Some(description) = changes.description.filter(|d| !d.is_empty()) {
            template.description = description;
        }
        if let Some(secs) = changes.default_duration_secs {
            template.default_duration_secs = validate_duration(secs)?;
        }

        let template = self.store.update_template(&template).await?;
        tracing::info!(template_id = %template.id, actor = %actor.user_id, "template updated");
        notify(
            &self.hub,
            Notification::TemplateUpdated {
                template: TemplateSnapshot::from(&template),
            },
        )
        .await;
        Ok(template)
    }

    /// Deletes a template.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TemplateNotFound`] or [`TaskboardError::Forbidden`].
    pub async fn delete_template(&self, actor: &AuthUser, id: TemplateId) -> Result<(), TaskboardError> {
        let template = self.get_template(id).await?;
        ensure_may_modify(actor, &template)?;
        if !self.store.delete_template(id).await? {
            return Err(TaskboardError::TemplateNotFound(id.get()));
        }
        tracing::info!(template_id = %id, actor = %actor.user_id, "template deleted");
        notify(&self.hub, Notification::TemplateDeleted { template_id: id }).await;
        Ok(())
    }

    /// Instantiates a pending task from a template.
    ///
    /// The task is owned by and assigned solely to `actor`; its due date is
    /// now plus the template's default duration.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::TemplateNotFound`] if absent.
    pub async fn create_task_from_template(
        &self,
        actor: &AuthUser,
        template_id: TemplateId,
    ) -> Result<TaskDetails, TaskboardError> {
        let template = self.get_template(template_id).await?;
        let task = self
            .store
            .insert_task(NewTask {
                name: template.name.clone(),
                description: template.description.clone(),
                due_date: Some(template.due_date_from(Utc::now())),
                status: TaskStatus::Pending,
                priority: String::new(),
                tags: String::new(),
                owner_id: actor.user_id,
                assignee_ids: vec![actor.user_id],
            })
            .await?;

        tracing::info!(task_id = %task.id, template_id = %template.id, "task created from template");
        notify(&self.hub, Notification::TaskCreated { task_id: task.id }).await;
        self.tasks.details(task).await
    }
}

fn ensure_may_modify(actor: &AuthUser, template: &TaskTemplate) -> Result<(), TaskboardError> {
    if actor.is_admin() || template.owner_id == actor.user_id {
        Ok(())
    } else {
        Err(TaskboardError::Forbidden(
            "you are not allowed to modify this task template".to_string(),
        ))
    }
}

fn validate_name(raw: &str) -> Result<String, TaskboardError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(TaskboardError::InvalidRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_TEMPLATE_NAME_LEN {
        return Err(TaskboardError::InvalidRequest("name is too long".to_string()));
    }
    Ok(name.to_string())
}

fn validate_duration(secs: i64) -> Result<i64, TaskboardError> {
    if secs < 0 {
        return Err(TaskboardError::InvalidRequest(
            "default_duration_secs must not be negative".to_string(),
        ));
    }
    if secs > MAX_DEFAULT_DURATION_SECS {
        return Err(TaskboardError::InvalidRequest(format!(
            "default_duration_secs must not exceed {MAX_DEFAULT_DURATION_SECS}"
        )));
    }
    Ok(secs)
}
