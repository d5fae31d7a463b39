//! Per-connection read and write workers.
//!
//! Each upgraded socket is registered with the [`Hub`] and then served by
//! two concurrent tasks: a writer that drains the connection's outbound
//! queue into text frames, and a reader that discards client input and
//! only watches for the socket going away. Whichever finishes first ends
//! the connection; dropping both socket halves closes the transport.

use std::fmt;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use super::hub::{Connection, ConnectionId, Hub};

/// Serves one WebSocket connection until it closes.
///
/// Registration happens before any frame is read, so the client receives
/// every notification published after the upgrade completes.
pub async fn run_connection(socket: WebSocket, hub: Hub) {
    let connection = match hub.register().await {
        Ok(connection) => connection,
        Err(err) => {
            tracing::warn!(error = %err, "rejecting ws connection");
            return;
        }
    };
    let (ws_tx, ws_rx) = socket.split();
    serve(&hub, connection, ws_tx, ws_rx).await;
}

/// Runs the reader and writer of a registered connection until either
/// stops, then deregisters it.
async fn serve<W, R, E>(hub: &Hub, connection: Connection, ws_tx: W, ws_rx: R)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: fmt::Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let (id, outbound) = connection.into_parts();
    tracing::debug!(connection = %id, "ws connection opened");

    let mut writer = tokio::spawn(write_pump(id, ws_tx, outbound));

    let writer_result = tokio::select! {
        () = read_pump(id, ws_rx) => None,
        joined = &mut writer => Some(joined),
    };
    hub.deregister(id).await;

    // After a reader exit the writer finishes once the hub has dropped the
    // outbound sender.
    let joined = match writer_result {
        Some(joined) => joined,
        None => writer.await,
    };
    if let Err(err) = joined {
        tracing::warn!(connection = %id, error = %err, "ws writer task failed");
    }
    tracing::debug!(connection = %id, "ws connection closed");
}

/// Writes queued payloads to the socket, one text frame each.
///
/// Stops on the first write error. When the hub closes the queue a close
/// frame is sent before returning.
async fn write_pump<W>(id: ConnectionId, mut ws_tx: W, mut outbound: mpsc::Receiver<Utf8Bytes>)
where
    W: Sink<Message> + Unpin,
    W::Error: fmt::Display,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(err) = ws_tx.send(Message::Text(payload)).await {
            tracing::debug!(connection = %id, error = %err, "ws write failed");
            return;
        }
    }

    if let Err(err) = ws_tx.send(Message::Close(None)).await {
        tracing::debug!(connection = %id, error = %err, "ws close frame not delivered");
    }
}

/// Reads and discards client frames until the stream ends or errors.
async fn read_pump<R, E>(id: ConnectionId, mut ws_rx: R)
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(connection = %id, error = %err, "ws read failed");
                break;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use futures_util::{sink, stream};
    use tokio::time::timeout;

    use super::*;
    use crate::ws::HubConfig;

    const WAIT: Duration = Duration::from_secs(2);

    /// A transport whose every write fails.
    struct BrokenSink;

    impl Sink<Message> for BrokenSink {
        type Error = io::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Err(io::Error::other("broken pipe")))
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), io::Error> {
            Err(io::Error::other("broken pipe"))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn registered(hub: &Hub) -> Connection {
        let Ok(conn) = hub.register().await else {
            panic!("registration failed");
        };
        conn
    }

    #[tokio::test]
    async fn write_failure_ends_idle_reader_and_deregisters() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = registered(&hub).await;

        let served = tokio::spawn({
            let hub = hub.clone();
            async move {
                let silent_client = stream::pending::<Result<Message, io::Error>>();
                serve(&hub, conn, BrokenSink, silent_client).await;
            }
        });

        hub.publish("first").await;

        assert!(matches!(timeout(WAIT, served).await, Ok(Ok(()))));
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn client_close_deregisters_and_stops_writer() {
        let hub = Hub::spawn(HubConfig::default());
        let conn = registered(&hub).await;
        let id = conn.id();

        let closing_client = stream::iter(vec![Ok::<_, io::Error>(Message::Close(None))]);
        let finished = timeout(WAIT, serve(&hub, conn, sink::drain(), closing_client)).await;

        assert!(finished.is_ok());
        assert!(!hub.is_connected(id).await);
    }
}
