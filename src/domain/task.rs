//! Tasks, their statuses, and list query options.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{TaskId, UserId};
use crate::error::TaskboardError;

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
}

impl TaskStatus {
    /// Returns the canonical name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(TaskboardError::InvalidStatus(other.to_string())),
        }
    }
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Row id.
    pub id: TaskId,
    /// Short title. Never empty.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Workflow state.
    pub status: TaskStatus,
    /// Free-form priority label.
    pub priority: String,
    /// Free-form tag list.
    pub tags: String,
    /// Creator, or the user the task was handed over to.
    pub owner_id: UserId,
    /// Users the task is assigned to, ascending by id.
    pub assignee_ids: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Returns `true` if `user` is one of the assignees.
    #[must_use]
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assignee_ids.contains(&user)
    }

    /// Returns `true` if `user` owns the task or is assigned to it.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.owner_id == user || self.is_assigned_to(user)
    }
}

/// Fields required to insert a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Short title.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Initial state.
    pub status: TaskStatus,
    /// Priority label.
    pub priority: String,
    /// Tag list.
    pub tags: String,
    /// Owner.
    pub owner_id: UserId,
    /// Initial assignees.
    pub assignee_ids: Vec<UserId>,
}

/// Column a task list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    /// Order by task name.
    Name,
    /// Order by due date; tasks without one sort last ascending.
    DueDate,
}

impl FromStr for TaskSortField {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "due_date" => Ok(Self::DueDate),
            _ => Err(TaskboardError::InvalidRequest(
                "invalid sort_by field".to_string(),
            )),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl FromStr for SortOrder {
    type Err = TaskboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(TaskboardError::InvalidRequest(
                "invalid order field".to_string(),
            )),
        }
    }
}

/// Filter and ordering for task listings.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Only tasks in one of these states. Empty means all.
    pub statuses: Vec<TaskStatus>,
    /// Only tasks owned by or assigned to this user. `None` means all.
    pub visible_to: Option<UserId>,
    /// Ordering column. `None` orders by id.
    pub sort_by: Option<TaskSortField>,
    /// Direction for `sort_by`.
    pub order: SortOrder,
}

impl TaskQuery {
    /// Returns `true` if `task` passes the status and visibility filters.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&task.status);
        let visible = self.visible_to.is_none_or(|user| task.involves(user));
        status_ok && visible
    }

    /// Orders two tasks according to `sort_by`/`order`, id breaking ties.
    ///
    /// Missing due dates behave like SQL `NULL`s: last when ascending,
    /// first when descending.
    #[must_use]
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.sort_by {
            None => Ordering::Equal,
            Some(TaskSortField::Name) => a.name.cmp(&b.name),
            Some(TaskSortField::DueDate) => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Parses a comma-separated, case-insensitive status filter.
///
/// # Errors
///
/// Returns [`TaskboardError::InvalidRequest`] if any element is not a known
/// status.
pub fn parse_status_filter(raw: &str) -> Result<Vec<TaskStatus>, TaskboardError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.to_lowercase()
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<TaskStatus>()
                .map_err(|_| TaskboardError::InvalidRequest("invalid status field".to_string()))
        })
        .collect()
}

/// Parses a due date in one of the accepted layouts.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`. Values without an offset are
/// taken as UTC; a bare date means midnight.
///
/// # Errors
///
/// Returns [`TaskboardError::InvalidDate`] if no layout matches.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, TaskboardError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(TaskboardError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn task(id: i64, name: &str, due: Option<DateTime<Utc>>) -> Task {
        let now = Utc::now();
        Task {
            id: TaskId::new(id),
            name: name.to_string(),
            description: String::new(),
            due_date: due,
            status: TaskStatus::Pending,
            priority: String::new(),
            tags: String::new(),
            owner_id: UserId::new(1),
            assignee_ids: vec![UserId::new(2)],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_filter_accepts_mixed_case_list() {
        let Ok(statuses) = parse_status_filter("Pending,IN_PROGRESS") else {
            panic!("filter should parse");
        };
        assert_eq!(statuses, vec![TaskStatus::Pending, TaskStatus::InProgress]);
    }

    #[test]
    fn status_filter_rejects_unknown() {
        assert!(parse_status_filter("pending,done").is_err());
        assert!(parse_status_filter("").is_ok_and(|s| s.is_empty()));
    }

    #[test]
    fn due_date_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single();
        assert_eq!(parse_due_date("2024-05-01T12:30:00Z").ok(), expected);
        assert_eq!(parse_due_date("2024-05-01T14:30:00+02:00").ok(), expected);
        assert_eq!(parse_due_date("2024-05-01 12:30:00").ok(), expected);
        assert_eq!(parse_due_date("2024-05-01T12:30:00").ok(), expected);
        assert_eq!(
            parse_due_date("2024-05-01").ok(),
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single()
        );
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn visibility_covers_owner_and_assignee() {
        let t = task(1, "a", None);
        let query = |user| TaskQuery {
            visible_to: Some(UserId::new(user)),
            ..TaskQuery::default()
        };
        assert!(query(1).matches(&t));
        assert!(query(2).matches(&t));
        assert!(!query(3).matches(&t));
        assert!(TaskQuery::default().matches(&t));
    }

    #[test]
    fn due_date_sort_puts_missing_last_ascending() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single();
        let mut tasks = vec![task(1, "x", None), task(2, "y", late), task(3, "z", early)];

        let mut query = TaskQuery {
            sort_by: Some(TaskSortField::DueDate),
            ..TaskQuery::default()
        };
        tasks.sort_by(|a, b| query.compare(a, b));
        let ids: Vec<i64> = tasks.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        query.order = SortOrder::Desc;
        tasks.sort_by(|a, b| query.compare(a, b));
        let ids: Vec<i64> = tasks.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn sort_options_parse() {
        assert_eq!("name".parse::<TaskSortField>().ok(), Some(TaskSortField::Name));
        assert!("priority".parse::<TaskSortField>().is_err());
        assert_eq!("desc".parse::<SortOrder>().ok(), Some(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
