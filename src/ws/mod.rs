//! WebSocket layer: the notification hub and its connection workers.
//!
//! The endpoint at `/ws` upgrades to a one-way notification channel. Every
//! mutation in the service layer publishes a small JSON message through the
//! [`Hub`]; clients use it as a hint to refetch.

pub mod connection;
pub mod handler;
pub mod hub;

pub use hub::{Connection, ConnectionId, Hub, HubConfig, HubDispatcher, HubError};
