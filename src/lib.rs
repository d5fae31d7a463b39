//! # taskboard
//!
//! Multi-user task tracking service with a WebSocket change-notification hub.
//!
//! Users register, log in with a bearer token, and manage tasks and reusable
//! task templates over REST. Every mutation is pushed as a small JSON
//! notification to all clients connected on `/ws`, which treat it as a hint
//! to refresh.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)  ── auth middleware (auth/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── User / Task / Template services (service/)
//!     │       │                     │
//!     │       ▼                     ▼
//!     │   Store (persistence/)   Hub ──► HubDispatcher ──► per-connection queues
//!     │       │
//!     └── PostgreSQL or in-memory tables
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
