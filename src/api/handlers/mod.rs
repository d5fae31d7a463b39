//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod auth;
pub mod system;
pub mod task;
pub mod template;
pub mod user;

use axum::Router;
use axum::middleware;

use crate::app_state::AppState;
use crate::auth::{require_admin, require_auth};

/// Composes all resource routes under `/api/v1`.
///
/// Everything except sign-up and login sits behind [`require_auth`]; the
/// `/admin` subtree additionally behind [`require_admin`].
pub fn routes(state: AppState) -> Router<AppState> {
    let admin = admin::routes().route_layer(middleware::from_fn(require_admin));

    let protected = Router::new()
        .merge(auth::routes())
        .merge(user::routes())
        .merge(task::routes())
        .merge(template::routes())
        .nest("/admin", admin)
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .merge(auth::public_routes())
        .merge(protected)
}
