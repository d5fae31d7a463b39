//! End-to-end notification delivery over a real socket.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use common::test_app;
use taskboard::app_state::AppState;

async fn wait_for_connections(state: &AppState, expected: usize) {
    for _ in 0..100 {
        if state.hub.connection_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("hub never reached {expected} connections");
}

async fn next_notification<S>(ws: &mut S) -> Value
where
    S: futures_util::stream::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let Ok(Some(Ok(message))) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await
    else {
        panic!("no notification received");
    };
    let Ok(text) = message.to_text() else {
        panic!("expected a text frame");
    };
    let Ok(json) = serde_json::from_str(text) else {
        panic!("notification is not json: {text}");
    };
    json
}

#[tokio::test]
async fn task_creation_reaches_every_subscriber() {
    let (app, state) = test_app().await;
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let url = format!("ws://{addr}/ws");
    let Ok((mut first, _)) = connect_async(url.as_str()).await else {
        panic!("first ws connect failed");
    };
    let Ok((mut second, _)) = connect_async(url.as_str()).await else {
        panic!("second ws connect failed");
    };
    wait_for_connections(&state, 2).await;

    let http = reqwest::Client::new();
    let base = format!("http://{addr}/api/v1");
    let Ok(login) = http
        .post(format!("{base}/login"))
        .json(&json!({ "username": "admin", "password": "admin123" }))
        .send()
        .await
    else {
        panic!("login request failed");
    };
    let Ok(login) = login.json::<Value>().await else {
        panic!("login body unreadable");
    };
    let token = login["token"].as_str().unwrap_or_default().to_string();

    let Ok(created) = http
        .post(format!("{base}/tasks"))
        .bearer_auth(&token)
        .json(&json!({ "name": "broadcast me" }))
        .send()
        .await
    else {
        panic!("create request failed");
    };
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let Ok(task) = created.json::<Value>().await else {
        panic!("task body unreadable");
    };

    for ws in [&mut first, &mut second] {
        let note = next_notification(ws).await;
        assert_eq!(note["message"], "new task created");
        assert_eq!(note["task_id"], task["id"]);
    }
}

#[tokio::test]
async fn closed_client_is_deregistered() {
    let (app, state) = test_app().await;
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let Ok((mut ws, _)) = connect_async(format!("ws://{addr}/ws")).await else {
        panic!("ws connect failed");
    };
    wait_for_connections(&state, 1).await;

    let _ = ws.close(None).await;
    wait_for_connections(&state, 0).await;
}
