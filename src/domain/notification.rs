//! Change notifications pushed to connected clients.
//!
//! Every successful mutation in the service layer publishes a
//! [`Notification`] through the [`crate::ws::Hub`]. Clients treat them as
//! refresh hints; the hub itself never inspects the payload.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Task, TaskId, TaskStatus, TaskTemplate, TemplateId, UserId};

/// Subset of task fields included in `task updated` notifications.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: TaskId,
    /// Task name.
    pub name: String,
    /// Task description.
    pub description: String,
    /// Deadline, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Current state.
    pub status: TaskStatus,
    /// Current owner.
    pub owner_id: UserId,
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            status: task.status,
            owner_id: task.owner_id,
        }
    }
}

/// Subset of template fields included in `task template updated`
/// notifications.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSnapshot {
    /// Template id.
    pub id: TemplateId,
    /// Template name.
    pub name: String,
    /// Template description.
    pub description: String,
    /// Owner.
    pub owner_id: UserId,
}

impl From<&TaskTemplate> for TemplateSnapshot {
    fn from(template: &TaskTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            description: template.description.clone(),
            owner_id: template.owner_id,
        }
    }
}

/// Notification emitted after a state mutation.
///
/// Serialized with a human-readable `message` discriminator, e.g.
/// `{"message":"task updated","task":{...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "message")]
pub enum Notification {
    /// A task was created directly or from a template.
    #[serde(rename = "new task created")]
    TaskCreated {
        /// New task id.
        task_id: TaskId,
    },
    /// A task was modified.
    #[serde(rename = "task updated")]
    TaskUpdated {
        /// State after the update.
        task: TaskSnapshot,
    },
    /// A task was removed.
    #[serde(rename = "task deleted")]
    TaskDeleted {
        /// Removed task id.
        task_id: TaskId,
    },
    /// A template was created.
    #[serde(rename = "new task template created")]
    TemplateCreated {
        /// New template id.
        template_id: TemplateId,
    },
    /// A template was modified.
    #[serde(rename = "task template updated")]
    TemplateUpdated {
        /// State after the update.
        #[serde(rename = "taskTemplate")]
        template: TemplateSnapshot,
    },
    /// A template was removed.
    #[serde(rename = "task template deleted")]
    TemplateDeleted {
        /// Removed template id.
        template_id: TemplateId,
    },
    /// An account was created by an administrator.
    #[serde(rename = "user created")]
    UserCreated {
        /// New user id.
        user_id: UserId,
    },
    /// An account's profile or role changed.
    #[serde(rename = "user updated")]
    UserUpdated {
        /// Affected user id.
        user_id: UserId,
    },
    /// An account was removed.
    #[serde(rename = "user deleted")]
    UserDeleted {
        /// Removed user id.
        user_id: UserId,
    },
}

impl Notification {
    /// Encodes the notification as a JSON text payload.
    ///
    /// Returns `None` only if serialization fails, which the field types
    /// rule out in practice.
    #[must_use]
    pub fn to_payload(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::error!(error = %err, "failed to encode notification");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn created_notification_shape() {
        let payload = Notification::TaskCreated {
            task_id: TaskId::new(5),
        }
        .to_payload();
        assert_eq!(
            payload.as_deref(),
            Some(r#"{"message":"new task created","task_id":5}"#)
        );
    }

    #[test]
    fn updated_notification_carries_snapshot() {
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(9),
            name: "ship".to_string(),
            description: "release 1.0".to_string(),
            due_date: None,
            status: TaskStatus::InProgress,
            priority: String::new(),
            tags: String::new(),
            owner_id: UserId::new(3),
            assignee_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let Some(payload) = Notification::TaskUpdated {
            task: TaskSnapshot::from(&task),
        }
        .to_payload() else {
            panic!("encoding failed");
        };
        let Ok(json) = serde_json::from_str::<serde_json::Value>(&payload) else {
            panic!("payload is not json");
        };
        assert_eq!(json["message"], "task updated");
        assert_eq!(json["task"]["id"], 9);
        assert_eq!(json["task"]["status"], "in_progress");
        assert_eq!(json["task"]["owner_id"], 3);
    }

    #[test]
    fn template_update_uses_camel_case_key() {
        let now = Utc::now();
        let template = TaskTemplate {
            id: TemplateId::new(2),
            name: "standup".to_string(),
            description: String::new(),
            default_duration_secs: 0,
            owner_id: UserId::new(1),
            created_at: now,
            updated_at: now,
        };
        let Some(payload) = Notification::TemplateUpdated {
            template: TemplateSnapshot::from(&template),
        }
        .to_payload() else {
            panic!("encoding failed");
        };
        assert!(payload.contains(r#""taskTemplate":{"id":2"#));
    }
}
