//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenAuthority};
use crate::config::TaskboardConfig;
use crate::persistence::Store;
use crate::service::{TaskService, TemplateService, UserService};
use crate::ws::Hub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Account operations.
    pub users: UserService,
    /// Task operations.
    pub tasks: TaskService,
    /// Template operations.
    pub templates: TemplateService,
    /// Store handle, for health checks.
    pub store: Arc<Store>,
    /// Notification hub handle.
    pub hub: Hub,
    /// Session token validation for the auth middleware.
    pub tokens: TokenAuthority,
}

impl AppState {
    /// Wires the services around `store` and `hub` using `config` for the
    /// credential settings.
    #[must_use]
    pub fn new(store: Arc<Store>, hub: Hub, config: &TaskboardConfig) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let tokens = TokenAuthority::new(
            config.jwt_secret.as_bytes(),
            chrono::Duration::hours(config.token_ttl_hours),
        );
        let tasks = TaskService::new(Arc::clone(&store), hub.clone());
        Self {
            users: UserService::new(Arc::clone(&store), hub.clone(), hasher, tokens.clone()),
            templates: TemplateService::new(Arc::clone(&store), hub.clone(), tasks.clone()),
            tasks,
            store,
            hub,
            tokens,
        }
    }
}
