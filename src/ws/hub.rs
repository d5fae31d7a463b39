//! Fan-out hub for change notifications.
//!
//! The [`Hub`] is a cloneable handle used by publishers and by the
//! WebSocket layer. All mutations of the live connection set go through
//! three bounded queues (register, deregister, broadcast) that are drained
//! by a single [`HubDispatcher`] task. The set itself sits behind a mutex so
//! that read-only helpers such as [`Hub::connection_count`] see a consistent
//! view.
//!
//! Delivery is best-effort and at-most-once. Each connection owns a bounded
//! outbound queue; a broadcast never waits on it. When the queue is full the
//! connection is evicted: removed from the set and its queue closed, which
//! makes its writer send a close frame and stop.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};

/// Queue depth for register/deregister requests.
const CONTROL_QUEUE_CAPACITY: usize = 32;

/// Identity of one registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned by hub operations that need the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The dispatcher task has stopped; no new connections are accepted.
    #[error("notification hub is not running")]
    Closed,
}

/// Sizing of the hub queues.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of the inbound broadcast queue. Publishers wait when full.
    pub broadcast_capacity: usize,
    /// Default capacity of each connection's outbound queue.
    pub client_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            client_queue_capacity: 256,
        }
    }
}

type ConnectionSet = HashMap<ConnectionId, mpsc::Sender<Utf8Bytes>>;

#[derive(Debug)]
struct Registration {
    id: ConnectionId,
    outbound: mpsc::Sender<Utf8Bytes>,
    done: oneshot::Sender<()>,
}

#[derive(Debug)]
struct Deregistration {
    id: ConnectionId,
    done: oneshot::Sender<()>,
}

/// Handle to the notification hub.
///
/// Cheap to clone. The dispatcher stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct Hub {
    broadcast_tx: mpsc::Sender<Utf8Bytes>,
    register_tx: mpsc::Sender<Registration>,
    deregister_tx: mpsc::Sender<Deregistration>,
    connections: Arc<Mutex<ConnectionSet>>,
    client_queue_capacity: usize,
}

/// Receiving side of a registered connection.
///
/// Yields payloads in the order the hub enqueued them. Returns `None` once
/// the connection has been deregistered or evicted.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Receiver<Utf8Bytes>,
}

impl Connection {
    /// Returns this connection's identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Waits for the next payload.
    pub async fn recv(&mut self) -> Option<Utf8Bytes> {
        self.outbound.recv().await
    }

    /// Splits into the id and the raw outbound receiver.
    #[must_use]
    pub fn into_parts(self) -> (ConnectionId, mpsc::Receiver<Utf8Bytes>) {
        (self.id, self.outbound)
    }
}

/// The single task that owns all mutations of the live connection set.
#[derive(Debug)]
pub struct HubDispatcher {
    broadcast_rx: mpsc::Receiver<Utf8Bytes>,
    register_rx: mpsc::Receiver<Registration>,
    deregister_rx: mpsc::Receiver<Deregistration>,
    connections: Arc<Mutex<ConnectionSet>>,
}

impl Hub {
    /// Creates a hub handle and the dispatcher that must be spawned to
    /// drive it.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubDispatcher) {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(config.broadcast_capacity.max(1));
        let (register_tx, register_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
        let (deregister_tx, deregister_rx) = mpsc::channel(CONTROL_QUEUE_CAPACITY);
        let connections = Arc::new(Mutex::new(HashMap::new()));

        let hub = Self {
            broadcast_tx,
            register_tx,
            deregister_tx,
            connections: Arc::clone(&connections),
            client_queue_capacity: config.client_queue_capacity.max(1),
        };
        let dispatcher = HubDispatcher {
            broadcast_rx,
            register_rx,
            deregister_rx,
            connections,
        };
        (hub, dispatcher)
    }

    /// Creates a hub and spawns its dispatcher on the current runtime.
    #[must_use]
    pub fn spawn(config: HubConfig) -> Self {
        let (hub, dispatcher) = Self::new(config);
        tokio::spawn(dispatcher.run());
        hub
    }

    /// Queues `payload` for delivery to every live connection.
    ///
    /// Waits only while the broadcast queue is full. If the dispatcher has
    /// stopped the payload is dropped with a warning.
    pub async fn publish(&self, payload: impl Into<Utf8Bytes>) {
        if self.broadcast_tx.send(payload.into()).await.is_err() {
            tracing::warn!("hub dispatcher stopped; notification dropped");
        }
    }

    /// Registers a new connection with the default outbound capacity.
    ///
    /// Resolves once the dispatcher has added it to the live set, so any
    /// payload published afterwards reaches it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the dispatcher is not running.
    pub async fn register(&self) -> Result<Connection, HubError> {
        self.register_with_capacity(self.client_queue_capacity).await
    }

    /// Registers a new connection with an explicit outbound capacity.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the dispatcher is not running.
    pub async fn register_with_capacity(&self, capacity: usize) -> Result<Connection, HubError> {
        let id = ConnectionId::new();
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));
        let (done_tx, done_rx) = oneshot::channel();

        self.register_tx
            .send(Registration {
                id,
                outbound: outbound_tx,
                done: done_tx,
            })
            .await
            .map_err(|_| HubError::Closed)?;
        done_rx.await.map_err(|_| HubError::Closed)?;

        Ok(Connection {
            id,
            outbound: outbound_rx,
        })
    }

    /// Removes a connection and closes its outbound queue.
    ///
    /// No-op if the connection is not registered (already deregistered or
    /// evicted). Resolves once the dispatcher has processed the request.
    pub async fn deregister(&self, id: ConnectionId) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .deregister_tx
            .send(Deregistration { id, done: done_tx })
            .await
            .is_err()
        {
            tracing::debug!(connection = %id, "hub stopped before deregistration");
            return;
        }
        let _ = done_rx.await;
    }

    /// Number of connections currently in the live set.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Returns `true` if `id` is in the live set.
    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }
}

impl HubDispatcher {
    /// Runs the dispatch loop until every [`Hub`] handle is dropped.
    ///
    /// Services one event per iteration; when several queues are ready the
    /// choice between them is random.
    pub async fn run(mut self) {
        tracing::info!("notification hub started");
        loop {
            tokio::select! {
                Some(registration) = self.register_rx.recv() => {
                    self.register(registration).await;
                }
                Some(deregistration) = self.deregister_rx.recv() => {
                    self.deregister(deregistration).await;
                }
                Some(payload) = self.broadcast_rx.recv() => {
                    self.broadcast(payload).await;
                }
                else => break,
            }
        }
        tracing::info!("notification hub stopped");
    }

    async fn register(&self, registration: Registration) {
        let Registration { id, outbound, done } = registration;
        let live = {
            let mut connections = self.connections.lock().await;
            connections.insert(id, outbound);
            connections.len()
        };
        tracing::debug!(connection = %id, live, "connection registered");
        let _ = done.send(());
    }

    async fn deregister(&self, deregistration: Deregistration) {
        let Deregistration { id, done } = deregistration;
        // Dropping the sender closes the outbound queue.
        let removed = self.connections.lock().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(connection = %id, "connection deregistered");
        }
        let _ = done.send(());
    }

    async fn broadcast(&self, payload: Utf8Bytes) {
        let mut connections = self.connections.lock().await;
        let before = connections.len();
        connections.retain(|id, outbound| match outbound.try_send(payload.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(connection = %id, "outbound queue full; evicting connection");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(connection = %id, "outbound queue closed; evicting connection");
                false
            }
        });
        let evicted = before - connections.len();
        tracing::trace!(delivered = connections.len(), evicted, "broadcast dispatched");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    async fn next(conn: &mut Connection) -> Option<Utf8Bytes> {
        match timeout(WAIT, conn.recv()).await {
            Ok(item) => item,
            Err(_) => panic!("timed out waiting for connection {}", conn.id()),
        }
    }

    async fn register(hub: &Hub) -> Connection {
        let Ok(conn) = hub.register().await else {
            panic!("registration failed");
        };
        conn
    }

    #[tokio::test]
    async fn every_live_connection_receives_one_copy() {
        let hub = Hub::spawn(HubConfig::default());
        let mut conns = Vec::new();
        for _ in 0..5 {
            conns.push(register(&hub).await);
        }

        hub.publish("ping").await;

        for conn in &mut conns {
            let got = next(conn).await;
            assert_eq!(got.as_ref().map(Utf8Bytes::as_str), Some("ping"));
            assert!(conn.outbound.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn late_joiner_misses_earlier_payload() {
        let hub = Hub::spawn(HubConfig::default());
        let mut early = register(&hub).await;

        hub.publish("first").await;
        assert_eq!(next(&mut early).await.as_ref().map(Utf8Bytes::as_str), Some("first"));

        let mut late = register(&hub).await;
        hub.publish("second").await;

        assert_eq!(next(&mut late).await.as_ref().map(Utf8Bytes::as_str), Some("second"));
        assert_eq!(next(&mut early).await.as_ref().map(Utf8Bytes::as_str), Some("second"));
    }

    #[tokio::test]
    async fn saturated_connection_is_evicted_others_unaffected() {
        let hub = Hub::spawn(HubConfig::default());
        let Ok(mut slow) = hub.register_with_capacity(1).await else {
            panic!("registration failed");
        };
        let mut fast = register(&hub).await;

        hub.publish("A").await;
        hub.publish("B").await;

        // The slow consumer got A, then its queue was closed by the eviction.
        assert_eq!(next(&mut slow).await.as_ref().map(Utf8Bytes::as_str), Some("A"));
        assert!(next(&mut slow).await.is_none());
        assert!(!hub.is_connected(slow.id()).await);

        assert_eq!(next(&mut fast).await.as_ref().map(Utf8Bytes::as_str), Some("A"));
        assert_eq!(next(&mut fast).await.as_ref().map(Utf8Bytes::as_str), Some("B"));
        assert!(hub.is_connected(fast.id()).await);
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn deregistering_unknown_connection_is_noop() {
        let hub = Hub::spawn(HubConfig::default());
        let mut conn = register(&hub).await;

        hub.deregister(ConnectionId::new()).await;
        hub.deregister(conn.id()).await;
        hub.deregister(conn.id()).await;

        assert_eq!(hub.connection_count().await, 0);
        assert!(next(&mut conn).await.is_none());
    }

    #[tokio::test]
    async fn payloads_arrive_in_publish_order() {
        let hub = Hub::spawn(HubConfig::default());
        let mut conn = register(&hub).await;

        for i in 0..20 {
            hub.publish(format!("msg-{i}")).await;
        }
        for i in 0..20 {
            let expected = format!("msg-{i}");
            assert_eq!(
                next(&mut conn).await.as_ref().map(Utf8Bytes::as_str),
                Some(expected.as_str())
            );
        }
    }

    #[tokio::test]
    async fn deregistered_connection_stops_receiving() {
        let hub = Hub::spawn(HubConfig::default());
        let mut c1 = register(&hub).await;
        let mut c2 = register(&hub).await;

        hub.publish(r#"{"message":"x"}"#).await;
        assert_eq!(next(&mut c1).await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"message":"x"}"#));
        assert_eq!(next(&mut c2).await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"message":"x"}"#));

        hub.deregister(c1.id()).await;
        hub.publish(r#"{"message":"y"}"#).await;

        assert_eq!(next(&mut c2).await.as_ref().map(Utf8Bytes::as_str), Some(r#"{"message":"y"}"#));
        assert!(next(&mut c1).await.is_none());
    }

    #[tokio::test]
    async fn register_fails_once_dispatcher_is_gone() {
        let (hub, dispatcher) = Hub::new(HubConfig::default());
        drop(dispatcher);
        assert!(matches!(hub.register().await, Err(HubError::Closed)));
        // Publishing after shutdown is silently dropped.
        hub.publish("lost").await;
    }

    #[tokio::test]
    async fn dispatcher_exits_when_handles_dropped() {
        let (hub, dispatcher) = Hub::new(HubConfig::default());
        let task = tokio::spawn(dispatcher.run());
        drop(hub);
        assert!(timeout(WAIT, task).await.is_ok());
    }
}
