//! Task template DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{TaskTemplate, TemplateId, UserId};
use crate::service::{TemplateChanges, TemplateInput};

/// Request body for `POST /templates`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    /// Required name, at most 255 characters.
    #[serde(default)]
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Default task duration in seconds (≥ 0).
    pub default_duration_secs: Option<i64>,
}

impl From<CreateTemplateRequest> for TemplateInput {
    fn from(req: CreateTemplateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            default_duration_secs: req.default_duration_secs,
        }
    }
}

/// Request body for `PUT /templates/{id}`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New default duration in seconds.
    pub default_duration_secs: Option<i64>,
}

impl From<UpdateTemplateRequest> for TemplateChanges {
    fn from(req: UpdateTemplateRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            default_duration_secs: req.default_duration_secs,
        }
    }
}

/// A stored template.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateResponse {
    /// Template id.
    pub id: TemplateId,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Default duration in seconds.
    pub default_duration_secs: i64,
    /// Owner id.
    pub owner_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<TaskTemplate> for TemplateResponse {
    fn from(t: TaskTemplate) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            default_duration_secs: t.default_duration_secs,
            owner_id: t.owner_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Template list with its length.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TemplateListResponse {
    /// Templates ascending by id.
    pub templates: Vec<TemplateResponse>,
    /// Number of templates returned.
    pub total: usize,
}

impl From<Vec<TaskTemplate>> for TemplateListResponse {
    fn from(templates: Vec<TaskTemplate>) -> Self {
        let templates: Vec<TemplateResponse> =
            templates.into_iter().map(TemplateResponse::from).collect();
        Self {
            total: templates.len(),
            templates,
        }
    }
}
