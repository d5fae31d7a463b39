//! Service layer: business rules over the store, publishing notifications.
//!
//! Each service is a cheap-to-clone coordinator holding the shared
//! [`Store`](crate::persistence::Store) and a [`Hub`] handle. Every
//! successful mutation follows the same pattern: authorize the actor,
//! validate input, write through the store, then publish a
//! [`Notification`].

pub mod task_service;
pub mod template_service;
pub mod user_service;

pub use task_service::{TaskChanges, TaskDetails, TaskInput, TaskListParams, TaskService};
pub use template_service::{TemplateChanges, TemplateInput, TemplateService};
pub use user_service::{UserChanges, UserInput, UserService};

use crate::domain::Notification;
use crate::ws::Hub;

/// Encodes `notification` and hands it to the hub.
pub(crate) async fn notify(hub: &Hub, notification: Notification) {
    if let Some(payload) = notification.to_payload() {
        hub.publish(payload).await;
    }
}

/// Trims `value` and returns `None` if nothing is left.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::persistence::Store;
    use crate::ws::{Connection, Hub, HubConfig};

    /// In-memory store plus a running hub with one subscribed connection.
    pub(crate) async fn fixture() -> (Arc<Store>, Hub, Connection) {
        let hub = Hub::spawn(HubConfig::default());
        let Ok(conn) = hub.register().await else {
            panic!("register failed");
        };
        (Arc::new(Store::default()), hub, conn)
    }

    /// Receives the next payload as JSON.
    pub(crate) async fn next_json(conn: &mut Connection) -> serde_json::Value {
        let Some(payload) = conn.recv().await else {
            panic!("connection closed");
        };
        serde_json::from_str(payload.as_str()).unwrap_or(serde_json::Value::Null)
    }
}
