//! Persistence layer: users, tasks, assignees and templates.
//!
//! [`Store`] is the single entry point the services use. It dispatches to
//! either the PostgreSQL backend ([`PostgresStore`]) or the in-process
//! [`MemoryStore`] selected at startup by `PERSISTENCE_ENABLED`. Both enforce
//! the same constraints: unique usernames and emails, owners and assignees
//! must exist, and deleting a user cascades to what it owns.

pub mod memory;
pub mod postgres;

use crate::domain::{
    NewTask, NewTaskTemplate, NewUser, Task, TaskId, TaskQuery, TaskTemplate, TemplateId, User,
    UserId,
};
use crate::error::TaskboardError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Backend-agnostic store handle.
#[derive(Debug)]
pub enum Store {
    /// Volatile in-process tables.
    Memory(MemoryStore),
    /// PostgreSQL via `sqlx`.
    Postgres(PostgresStore),
}

impl Store {
    /// Short backend name, reported by the health endpoint.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Returns `true` if the backend can serve queries.
    pub async fn is_healthy(&self) -> bool {
        match self {
            Self::Memory(_) => true,
            Self::Postgres(pg) => pg.ping().await,
        }
    }

    // ── Users ───────────────────────────────────────────────────────────

    /// Inserts a user; the id and display color are assigned here.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::Conflict`] if the username or email is
    /// taken, or a persistence error.
    pub async fn insert_user(&self, new: NewUser) -> Result<User, TaskboardError> {
        match self {
            Self::Memory(m) => m.insert_user(new).await,
            Self::Postgres(pg) => pg.insert_user(new).await,
        }
    }

    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.user_by_id(id).await),
            Self::Postgres(pg) => pg.user_by_id(id).await,
        }
    }

    /// Looks a user up by exact username.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.user_by_username(username).await),
            Self::Postgres(pg) => pg.user_by_username(username).await,
        }
    }

    /// Looks a user up by exact email.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.user_by_email(email).await),
            Self::Postgres(pg) => pg.user_by_email(email).await,
        }
    }

    /// All users, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_users(&self) -> Result<Vec<User>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.list_users().await),
            Self::Postgres(pg) => pg.list_users().await,
        }
    }

    /// The subset of `ids` that exist, ascending by id, without duplicates.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.users_by_ids(ids).await),
            Self::Postgres(pg) => pg.users_by_ids(ids).await,
        }
    }

    /// Overwrites username, email, password hash and role.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::UserNotFound`], [`TaskboardError::Conflict`]
    /// or a persistence error.
    pub async fn update_user(&self, user: &User) -> Result<User, TaskboardError> {
        match self {
            Self::Memory(m) => m.update_user(user).await,
            Self::Postgres(pg) => pg.update_user(user).await,
        }
    }

    /// Deletes a user with its tasks, templates and assignments.
    /// Returns `false` if no such user existed.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn delete_user(&self, id: UserId) -> Result<bool, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.delete_user(id).await),
            Self::Postgres(pg) => pg.delete_user(id).await,
        }
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    /// Inserts a task together with its assignees.
    ///
    /// # Errors
    ///
    /// Fails if the owner or an assignee does not exist, or on database
    /// failure.
    pub async fn insert_task(&self, new: NewTask) -> Result<Task, TaskboardError> {
        match self {
            Self::Memory(m) => m.insert_task(new).await,
            Self::Postgres(pg) => pg.insert_task(new).await,
        }
    }

    /// Looks a task up by id, assignees included.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn task_by_id(&self, id: TaskId) -> Result<Option<Task>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.task_by_id(id).await),
            Self::Postgres(pg) => pg.task_by_id(id).await,
        }
    }

    /// Tasks matching `query`, in the order it requests.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.list_tasks(query).await),
            Self::Postgres(pg) => pg.list_tasks(query).await,
        }
    }

    /// Overwrites every mutable column and replaces the assignee set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::TaskNotFound`] or a persistence error.
    pub async fn update_task(&self, task: &Task) -> Result<Task, TaskboardError> {
        match self {
            Self::Memory(m) => m.update_task(task).await,
            Self::Postgres(pg) => pg.update_task(task).await,
        }
    }

    /// Deletes a task. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn delete_task(&self, id: TaskId) -> Result<bool, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.delete_task(id).await),
            Self::Postgres(pg) => pg.delete_task(id).await,
        }
    }

    // ── Templates ───────────────────────────────────────────────────────

    /// Inserts a template.
    ///
    /// # Errors
    ///
    /// Fails if the owner does not exist, or on database failure.
    pub async fn insert_template(
        &self,
        new: NewTaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        match self {
            Self::Memory(m) => m.insert_template(new).await,
            Self::Postgres(pg) => pg.insert_template(new).await,
        }
    }

    /// Looks a template up by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn template_by_id(
        &self,
        id: TemplateId,
    ) -> Result<Option<TaskTemplate>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.template_by_id(id).await),
            Self::Postgres(pg) => pg.template_by_id(id).await,
        }
    }

    /// Templates ascending by id, optionally restricted to one owner.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_templates(
        &self,
        owner: Option<UserId>,
    ) -> Result<Vec<TaskTemplate>, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.list_templates(owner).await),
            Self::Postgres(pg) => pg.list_templates(owner).await,
        }
    }

    /// Overwrites name, description, duration and owner.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::TemplateNotFound`] or a persistence error.
    pub async fn update_template(
        &self,
        template: &TaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        match self {
            Self::Memory(m) => m.update_template(template).await,
            Self::Postgres(pg) => pg.update_template(template).await,
        }
    }

    /// Deletes a template. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn delete_template(&self, id: TemplateId) -> Result<bool, TaskboardError> {
        match self {
            Self::Memory(m) => Ok(m.delete_template(id).await),
            Self::Postgres(pg) => pg.delete_template(id).await,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::Memory(MemoryStore::new())
    }
}
