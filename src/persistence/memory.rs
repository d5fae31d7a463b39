//! In-process store used when persistence is disabled and in tests.
//!
//! All tables live behind one [`tokio::sync::RwLock`], which keeps
//! multi-table operations (deleting a user and everything it owns) atomic.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::display_color;
use crate::domain::{
    NewTask, NewTaskTemplate, NewUser, Task, TaskId, TaskQuery, TaskTemplate, TemplateId, User,
    UserId,
};
use crate::error::TaskboardError;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    templates: BTreeMap<TemplateId, TaskTemplate>,
    next_user: i64,
    next_task: i64,
    next_template: i64,
}

/// Volatile store with the same semantics as the PostgreSQL backend.
///
/// Ids start at 1 and are never reused. Unique username/email constraints
/// are enforced here too, so callers see the same conflicts either way.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users ───────────────────────────────────────────────────────────

    pub(crate) async fn insert_user(&self, new: NewUser) -> Result<User, TaskboardError> {
        let mut tables = self.tables.write().await;
        check_unique(&tables, None, &new.username, &new.email)?;

        tables.next_user += 1;
        let id = UserId::new(tables.next_user);
        let now = Utc::now();
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            color: display_color(id),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    pub(crate) async fn user_by_id(&self, id: UserId) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    pub(crate) async fn user_by_username(&self, username: &str) -> Option<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub(crate) async fn user_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables.read().await;
        tables.users.values().find(|u| u.email == email).cloned()
    }

    pub(crate) async fn list_users(&self) -> Vec<User> {
        self.tables.read().await.users.values().cloned().collect()
    }

    pub(crate) async fn users_by_ids(&self, ids: &[UserId]) -> Vec<User> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect();
        users.sort_by_key(|u| u.id);
        users.dedup_by_key(|u| u.id);
        users
    }

    pub(crate) async fn update_user(&self, user: &User) -> Result<User, TaskboardError> {
        let mut tables = self.tables.write().await;
        check_unique(&tables, Some(user.id), &user.username, &user.email)?;
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(TaskboardError::UserNotFound(user.id.get()))?;
        *stored = User {
            updated_at: Utc::now(),
            created_at: stored.created_at,
            color: stored.color.clone(),
            ..user.clone()
        };
        Ok(stored.clone())
    }

    pub(crate) async fn delete_user(&self, id: UserId) -> bool {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return false;
        }
        tables.tasks.retain(|_, task| task.owner_id != id);
        for task in tables.tasks.values_mut() {
            task.assignee_ids.retain(|assignee| *assignee != id);
        }
        tables.templates.retain(|_, template| template.owner_id != id);
        true
    }

    // ── Tasks ───────────────────────────────────────────────────────────

    pub(crate) async fn insert_task(&self, new: NewTask) -> Result<Task, TaskboardError> {
        let mut tables = self.tables.write().await;
        check_users_exist(&tables, new.owner_id, &new.assignee_ids)?;

        tables.next_task += 1;
        let id = TaskId::new(tables.next_task);
        let now = Utc::now();
        let task = Task {
            id,
            name: new.name,
            description: new.description,
            due_date: new.due_date,
            status: new.status,
            priority: new.priority,
            tags: new.tags,
            owner_id: new.owner_id,
            assignee_ids: normalize(new.assignee_ids),
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    pub(crate) async fn task_by_id(&self, id: TaskId) -> Option<Task> {
        self.tables.read().await.tasks.get(&id).cloned()
    }

    pub(crate) async fn list_tasks(&self, query: &TaskQuery) -> Vec<Task> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .values()
            .filter(|task| query.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| query.compare(a, b));
        tasks
    }

    pub(crate) async fn update_task(&self, task: &Task) -> Result<Task, TaskboardError> {
        let mut tables = self.tables.write().await;
        check_users_exist(&tables, task.owner_id, &task.assignee_ids)?;
        let stored = tables
            .tasks
            .get_mut(&task.id)
            .ok_or(TaskboardError::TaskNotFound(task.id.get()))?;
        *stored = Task {
            assignee_ids: normalize(task.assignee_ids.clone()),
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..task.clone()
        };
        Ok(stored.clone())
    }

    pub(crate) async fn delete_task(&self, id: TaskId) -> bool {
        self.tables.write().await.tasks.remove(&id).is_some()
    }

    // ── Templates ───────────────────────────────────────────────────────

    pub(crate) async fn insert_template(
        &self,
        new: NewTaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        let mut tables = self.tables.write().await;
        check_users_exist(&tables, new.owner_id, &[])?;

        tables.next_template += 1;
        let id = TemplateId::new(tables.next_template);
        let now = Utc::now();
        let template = TaskTemplate {
            id,
            name: new.name,
            description: new.description,
            default_duration_secs: new.default_duration_secs,
            owner_id: new.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.templates.insert(id, template.clone());
        Ok(template)
    }

    pub(crate) async fn template_by_id(&self, id: TemplateId) -> Option<TaskTemplate> {
        self.tables.read().await.templates.get(&id).cloned()
    }

    pub(crate) async fn list_templates(&self, owner: Option<UserId>) -> Vec<TaskTemplate> {
        let tables = self.tables.read().await;
        tables
            .templates
            .values()
            .filter(|t| owner.is_none_or(|owner| t.owner_id == owner))
            .cloned()
            .collect()
    }

    pub(crate) async fn update_template(
        &self,
        template: &TaskTemplate,
    ) -> Result<TaskTemplate, TaskboardError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .templates
            .get_mut(&template.id)
            .ok_or(TaskboardError::TemplateNotFound(template.id.get()))?;
        *stored = TaskTemplate {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..template.clone()
        };
        Ok(stored.clone())
    }

    pub(crate) async fn delete_template(&self, id: TemplateId) -> bool {
        self.tables.write().await.templates.remove(&id).is_some()
    }
}

fn check_unique(
    tables: &Tables,
    except: Option<UserId>,
    username: &str,
    email: &str,
) -> Result<(), TaskboardError> {
    let others = tables.users.values().filter(|u| Some(u.id) != except);
    for user in others {
        if user.username == username {
            return Err(TaskboardError::Conflict("username already exists".to_string()));
        }
        if user.email == email {
            return Err(TaskboardError::Conflict("email already exists".to_string()));
        }
    }
    Ok(())
}

/// Mirrors the foreign keys of the SQL schema.
fn check_users_exist(
    tables: &Tables,
    owner: UserId,
    assignees: &[UserId],
) -> Result<(), TaskboardError> {
    std::iter::once(&owner)
        .chain(assignees)
        .find(|id| !tables.users.contains_key(id))
        .map_or(Ok(()), |missing| {
            Err(TaskboardError::UserNotFound(missing.get()))
        })
}

fn normalize(mut ids: Vec<UserId>) -> Vec<UserId> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Role, TaskSortField, TaskStatus};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    fn new_task(name: &str, owner: UserId, assignees: Vec<UserId>) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: String::new(),
            due_date: None,
            status: TaskStatus::Pending,
            priority: String::new(),
            tags: String::new(),
            owner_id: owner,
            assignee_ids: assignees,
        }
    }

    async fn user(store: &MemoryStore, name: &str) -> User {
        let Ok(user) = store.insert_user(new_user(name)).await else {
            panic!("insert user failed");
        };
        user
    }

    #[tokio::test]
    async fn ids_are_sequential_and_colors_assigned() {
        let store = MemoryStore::new();
        let a = user(&store, "a").await;
        let b = user(&store, "b").await;
        assert_eq!(a.id.get(), 1);
        assert_eq!(b.id.get(), 2);
        assert_eq!(a.color, "hsl(4, 70%, 80%)");
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        let _ = user(&store, "a").await;
        let dup_name = store.insert_user(new_user("a")).await;
        assert!(matches!(dup_name, Err(TaskboardError::Conflict(_))));

        let mut other = new_user("b");
        other.email = "a@example.com".to_string();
        assert!(matches!(
            store.insert_user(other).await,
            Err(TaskboardError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn visibility_and_status_filters() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let helper = user(&store, "helper").await;
        let outsider = user(&store, "outsider").await;

        let _ = store.insert_task(new_task("mine", owner.id, vec![])).await;
        let _ = store
            .insert_task(new_task("shared", owner.id, vec![helper.id]))
            .await;

        let for_helper = store
            .list_tasks(&TaskQuery {
                visible_to: Some(helper.id),
                ..TaskQuery::default()
            })
            .await;
        assert_eq!(for_helper.len(), 1);

        let for_outsider = store
            .list_tasks(&TaskQuery {
                visible_to: Some(outsider.id),
                ..TaskQuery::default()
            })
            .await;
        assert!(for_outsider.is_empty());

        let completed = store
            .list_tasks(&TaskQuery {
                statuses: vec![TaskStatus::Completed],
                ..TaskQuery::default()
            })
            .await;
        assert!(completed.is_empty());
    }

    #[tokio::test]
    async fn sort_by_name() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        for name in ["charlie", "alpha", "bravo"] {
            let _ = store.insert_task(new_task(name, owner.id, vec![])).await;
        }
        let tasks = store
            .list_tasks(&TaskQuery {
                sort_by: Some(TaskSortField::Name),
                ..TaskQuery::default()
            })
            .await;
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn unknown_assignee_is_rejected() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let result = store
            .insert_task(new_task("t", owner.id, vec![UserId::new(99)]))
            .await;
        assert!(matches!(result, Err(TaskboardError::UserNotFound(99))));
    }

    #[tokio::test]
    async fn deleting_user_cascades() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let helper = user(&store, "helper").await;
        let Ok(owned) = store.insert_task(new_task("owned", owner.id, vec![])).await else {
            panic!("insert failed");
        };
        let Ok(assigned) = store
            .insert_task(new_task("assigned", helper.id, vec![owner.id]))
            .await
        else {
            panic!("insert failed");
        };

        assert!(store.delete_user(owner.id).await);
        assert!(store.task_by_id(owned.id).await.is_none());
        let Some(assigned) = store.task_by_id(assigned.id).await else {
            panic!("helper's task should survive");
        };
        assert!(assigned.assignee_ids.is_empty());
        assert!(!store.delete_user(owner.id).await);
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_normalizes_assignees() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let helper = user(&store, "helper").await;
        let Ok(mut task) = store.insert_task(new_task("t", owner.id, vec![])).await else {
            panic!("insert failed");
        };
        let created = task.created_at;
        task.assignee_ids = vec![helper.id, owner.id, helper.id];
        let Ok(updated) = store.update_task(&task).await else {
            panic!("update failed");
        };
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.assignee_ids, vec![owner.id, helper.id]);
    }
}
