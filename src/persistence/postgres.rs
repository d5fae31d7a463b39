//! PostgreSQL implementation of the store.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::user::display_color;
use crate::domain::{
    NewTask, NewTaskTemplate, NewUser, Role, SortOrder, Task, TaskId, TaskQuery, TaskSortField,
    TaskStatus, TaskTemplate, TemplateId, User, UserId,
};
use crate::error::TaskboardError;

type UserRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

type TaskRow = (
    i64,
    String,
    String,
    Option<DateTime<Utc>>,
    String,
    String,
    String,
    i64,
    DateTime<Utc>,
    DateTime<Utc>,
);

type TemplateRow = (i64, String, String, i64, i64, DateTime<Utc>, DateTime<Utc>);

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, color, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, name, description, due_date, status, priority, tags, owner_id, created_at, updated_at";
const TEMPLATE_COLUMNS: &str =
    "id, name, description, default_duration_secs, owner_id, created_at, updated_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
///
/// Assignees live in the `task_assignees` join table; every foreign key
/// cascades so deleting a user removes what it owns.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskboardError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), TaskboardError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TaskboardError::PersistenceError(e.to_string()))
    }

    /// Round-trips a trivial query.
    pub(crate) async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    // ── Users ───────────────────────────────────────────────────────────

    pub(crate) async fn insert_user(&self, new: NewUser) -> Result<User, TaskboardError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET color = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(display_color(UserId::new(id)))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        user_from_row(row)
    }

    pub(crate) async fn user_by_id(&self, id: UserId) -> Result<Option<User>, TaskboardError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(user_from_row)
            .transpose()
    }

    pub(crate) async fn user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, TaskboardError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(user_from_row)
        .transpose()
    }

    pub(crate) async fn user_by_email(&self, email: &str) -> Result<Option<User>, TaskboardError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(user_from_row)
            .transpose()
    }

    pub(crate) async fn list_users(&self) -> Result<Vec<User>, TaskboardError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    pub(crate) async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, TaskboardError> {
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(raw)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(user_from_row)
        .collect()
    }

    pub(crate) async fn update_user(&self, user: &User) -> Result<User, TaskboardError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, role = $5, \
             updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id.get())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(TaskboardError::UserNotFound(user.id.get()))?;
        user_from_row(row)
    }

    pub(crate) async fn delete_user(&self, id: UserId) -> Result<bool, TaskboardError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    pub(crate) async fn insert_task(&self, new: NewTask) -> Result<Task, TaskboardError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (name, description, due_date, status, priority, tags, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {TASK_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.due_date)
        .bind(new.status.as_str())
        .bind(&new.priority)
        .bind(&new.tags)
        .bind(new.owner_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let task_id = row.0;
        let assignees = replace_assignees(&mut tx, task_id, &new.assignee_ids).await?;
        tx.commit().await?;

        task_from_row(row, assignees)
    }

    pub(crate) async fn task_by_id(&self, id: TaskId) -> Result<Option<Task>, TaskboardError> {
        let Some(row) = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };
        let mut assignees = self.assignees_of(&[row.0]).await?;
        let ids = assignees.remove(&row.0).unwrap_or_default();
        task_from_row(row, ids).map(Some)
    }

    pub(crate) async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, TaskboardError> {
        let statuses: Vec<&str> = query.statuses.iter().map(|s| s.as_str()).collect();
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let order_by = match query.sort_by {
            None => "id ASC".to_string(),
            Some(TaskSortField::Name) => format!("name {direction}, id ASC"),
            Some(TaskSortField::DueDate) => format!("due_date {direction}, id ASC"),
        };

        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE (cardinality($1::text[]) = 0 OR status = ANY($1)) \
               AND ($2::bigint IS NULL OR owner_id = $2 OR EXISTS ( \
                    SELECT 1 FROM task_assignees a WHERE a.task_id = tasks.id AND a.user_id = $2)) \
             ORDER BY {order_by}"
        ))
        .bind(statuses)
        .bind(query.visible_to.map(UserId::get))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.0).collect();
        let mut assignees = self.assignees_of(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let ids = assignees.remove(&row.0).unwrap_or_default();
                task_from_row(row, ids)
            })
            .collect()
    }

    pub(crate) async fn update_task(&self, task: &Task) -> Result<Task, TaskboardError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET name = $2, description = $3, due_date = $4, status = $5, \
             priority = $6, tags = $7, owner_id = $8, updated_at = now() \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.id.get())
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status.as_str())
        .bind(&task.priority)
        .bind(&task.tags)
        .bind(task.owner_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_write_error)?
        .ok_or(TaskboardError::TaskNotFound(task.id.get()))?;

        let assignees = replace_assignees(&mut tx, row.0, &task.assignee_ids).await?;
        tx.commit().await?;

        task_from_row(row, assignees)
    }

    pub(crate) async fn delete_task(&self, id: TaskId) -> Result<bool, TaskboardError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn assignees_of(
        &self,
        task_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<UserId>>, TaskboardError> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (i64, i64)>(
            "SELECT task_id, user_id FROM task_assignees \
             WHERE task_id = ANY($1) ORDER BY task_id, user_id",
        )
        .bind(task_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_task: HashMap<i64, Vec<UserId>> = HashMap::new();
        for (task_id, user_id) in rows {
            by_task.entry(task_id).or_default().push(UserId::new(user_id));
        }
        Ok(by_task)
    }

    // ── Templates ───────────────────────────────────────────────────────

    pub(crate) async fn insert_template(
        &self,
        new: NewTaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "INSERT INTO task_templates (name, description, default_duration_secs, owner_id) \
             VALUES ($1, $2, $3, $4) RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.default_duration_secs)
        .bind(new.owner_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(template_from_row(row))
    }

    pub(crate) async fn template_by_id(
        &self,
        id: TemplateId,
    ) -> Result<Option<TaskTemplate>, TaskboardError> {
        Ok(sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM task_templates WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(template_from_row))
    }

    pub(crate) async fn list_templates(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<TaskTemplate>, TaskboardError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM task_templates \
             WHERE ($1::bigint IS NULL OR owner_id = $1) ORDER BY id"
        ))
        .bind(owner.map(UserId::get))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(template_from_row).collect())
    }

    pub(crate) async fn update_template(
        &self,
        template: &TaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "UPDATE task_templates SET name = $2, description = $3, \
             default_duration_secs = $4, owner_id = $5, updated_at = now() \
             WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(template.id.get())
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.default_duration_secs)
        .bind(template.owner_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?
        .ok_or(TaskboardError::TemplateNotFound(template.id.get()))?;
        Ok(template_from_row(row))
    }

    pub(crate) async fn delete_template(&self, id: TemplateId) -> Result<bool, TaskboardError> {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn replace_assignees(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    task_id: i64,
    assignees: &[UserId],
) -> Result<Vec<UserId>, TaskboardError> {
    let mut ids: Vec<i64> = assignees.iter().map(|id| id.get()).collect();
    ids.sort_unstable();
    ids.dedup();

    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;
    if !ids.is_empty() {
        sqlx::query(
            "INSERT INTO task_assignees (task_id, user_id) SELECT $1, unnest($2::bigint[])",
        )
        .bind(task_id)
        .bind(&ids)
        .execute(&mut **tx)
        .await
        .map_err(map_write_error)?;
    }
    Ok(ids.into_iter().map(UserId::new).collect())
}

/// Translates constraint violations into domain errors.
fn map_write_error(err: sqlx::Error) -> TaskboardError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let message = match db.constraint() {
                Some(c) if c.contains("email") => "email already exists",
                _ => "username already exists",
            };
            return TaskboardError::Conflict(message.to_string());
        }
        if db.is_foreign_key_violation() {
            return TaskboardError::InvalidRequest("referenced user does not exist".to_string());
        }
    }
    err.into()
}

fn user_from_row(row: UserRow) -> Result<User, TaskboardError> {
    let (id, username, email, password_hash, role, color, created_at, updated_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|_| TaskboardError::PersistenceError(format!("user {id} has role {role:?}")))?;
    Ok(User {
        id: UserId::new(id),
        username,
        email,
        password_hash,
        role,
        color,
        created_at,
        updated_at,
    })
}

fn task_from_row(row: TaskRow, assignee_ids: Vec<UserId>) -> Result<Task, TaskboardError> {
    let (id, name, description, due_date, status, priority, tags, owner_id, created_at, updated_at) =
        row;
    let status = status.parse::<TaskStatus>().map_err(|_| {
        TaskboardError::PersistenceError(format!("task {id} has status {status:?}"))
    })?;
    Ok(Task {
        id: TaskId::new(id),
        name,
        description,
        due_date,
        status,
        priority,
        tags,
        owner_id: UserId::new(owner_id),
        assignee_ids,
        created_at,
        updated_at,
    })
}

fn template_from_row(row: TemplateRow) -> TaskTemplate {
    let (id, name, description, default_duration_secs, owner_id, created_at, updated_at) = row;
    TaskTemplate {
        id: TemplateId::new(id),
        name,
        description,
        default_duration_secs,
        owner_id: UserId::new(owner_id),
        created_at,
        updated_at,
    }
}
