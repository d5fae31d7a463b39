//! Shared fixtures for the integration tests.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use taskboard::api::build_app;
use taskboard::app_state::AppState;
use taskboard::config::TaskboardConfig;
use taskboard::persistence::Store;
use taskboard::ws::{Hub, HubConfig};

/// Application over an in-memory store, with the bootstrap admin
/// `admin` / `admin123` already created.
pub async fn test_app() -> (Router, AppState) {
    let Ok(config) = TaskboardConfig::from_lookup(|key| match key {
        "BCRYPT_COST" => Some("4".to_string()),
        "JWT_KEY" => Some("integration-secret".to_string()),
        _ => None,
    }) else {
        panic!("config failed");
    };
    let hub = Hub::spawn(HubConfig::default());
    let state = AppState::new(Arc::new(Store::default()), hub, &config);
    let Ok(Some(_)) = state
        .users
        .ensure_admin("admin", "admin", "admin123")
        .await
    else {
        panic!("bootstrap admin failed");
    };
    let app = build_app(state.clone(), Duration::from_secs(30));
    (app, state)
}

/// Sends one request and returns the status and parsed JSON body
/// (`Value::Null` for an empty or non-JSON body).
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request build failed");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Registers `username` with password `secret1` and returns its token.
pub async fn sign_up(app: &Router, username: &str) -> String {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/v1/register",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}");
    log_in(app, username, "secret1").await
}

/// Logs in and returns the bearer token.
pub async fn log_in(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {username}");
    let Some(token) = body["token"].as_str() else {
        panic!("no token in login response");
    };
    token.to_string()
}
