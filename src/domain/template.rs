//! Reusable task templates.

use chrono::{DateTime, Duration, Utc};

use super::{TemplateId, UserId};

/// Upper bound for a template's default duration: one hundred years.
pub const MAX_DEFAULT_DURATION_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// A stored task template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTemplate {
    /// Row id.
    pub id: TemplateId,
    /// Name copied into tasks created from the template.
    pub name: String,
    /// Description copied into tasks created from the template.
    pub description: String,
    /// Offset from "now" used as the due date of instantiated tasks.
    pub default_duration_secs: i64,
    /// Creator.
    pub owner_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    /// Due date for a task instantiated at `now`.
    ///
    /// Falls back to `now` when the offset is not positive or would leave
    /// the representable date range.
    #[must_use]
    pub fn due_date_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.default_duration_secs <= 0 {
            return now;
        }
        Duration::try_seconds(self.default_duration_secs)
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(now)
    }
}

/// Fields required to insert a template.
#[derive(Debug, Clone)]
pub struct NewTaskTemplate {
    /// Template name.
    pub name: String,
    /// Template description.
    pub description: String,
    /// Default duration in seconds.
    pub default_duration_secs: i64,
    /// Creator.
    pub owner_id: UserId,
}
