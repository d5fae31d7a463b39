//! Domain layer: entities, identifiers, and change notifications.
//!
//! Plain data types shared by the persistence, service and API layers.
//! Validation that depends only on a value (status names, date layouts,
//! sort options) lives here; rules that need the store live in
//! [`crate::service`].

pub mod ids;
pub mod notification;
pub mod task;
pub mod template;
pub mod user;

pub use ids::{TaskId, TemplateId, UserId};
pub use notification::Notification;
pub use task::{NewTask, SortOrder, Task, TaskQuery, TaskSortField, TaskStatus};
pub use template::{NewTaskTemplate, TaskTemplate};
pub use user::{NewUser, Role, User};
