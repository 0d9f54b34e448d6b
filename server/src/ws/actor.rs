use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::chat;
use crate::state::AppState;
use crate::ws::{protocol, ConnectionId, ConnectionSender, Heartbeat};

/// How long the writer may keep flushing (e.g. a pong-timeout close frame)
/// after the connection has left the registry.
const FLUSH_GRACE: Duration = Duration::from_secs(1);

/// Why a connection actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    ClientClosed,
    StreamEnded,
    ReceiveError,
    PongTimeout,
    WriterGone,
}

/// Run the actor-per-connection pattern for an upgraded WebSocket.
///
/// The outbound half is owned by a spawned writer fed from an mpsc queue; the
/// registry holds a clone of that queue's sender. Inbound frames and the
/// heartbeat race each other, and whichever finishes first ends the
/// connection: a client close, a broken stream or a missed pong all lead to
/// the same unregister.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    let connection_id = chat::broadcast::on_connect(&state.connections, tx.clone());
    let mut writer = tokio::spawn(drain_outbound(sink, rx));

    let (pong_tx, pong_rx) = mpsc::unbounded_channel::<()>();

    let exit = tokio::select! {
        exit = read_frames(stream, connection_id, &state, &tx, &pong_tx) => exit,
        exit = heartbeat(state.heartbeat, connection_id, &tx, pong_rx) => exit,
    };

    chat::broadcast::on_disconnect(&state.connections, connection_id);
    tracing::debug!(connection_id = %connection_id, reason = ?exit, "Connection actor stopped");

    // Registry clone is gone; dropping ours lets the writer drain and finish.
    drop(tx);
    if timeout(FLUSH_GRACE, &mut writer).await.is_err() {
        writer.abort();
    }
}

/// Forward queued frames into the socket until the queue closes or the
/// socket refuses a write.
async fn drain_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        let closing = matches!(msg, Message::Close(_));
        if sink.send(msg).await.is_err() || closing {
            break;
        }
    }
}

/// Dispatch inbound frames until the peer goes away.
async fn read_frames(
    mut stream: SplitStream<WebSocket>,
    connection_id: ConnectionId,
    state: &AppState,
    tx: &ConnectionSender,
    pong_tx: &mpsc::UnboundedSender<()>,
) -> Exit {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                protocol::handle_text_frame(text.as_str(), connection_id, &state.connections);
            }
            Ok(Message::Binary(data)) => {
                tracing::debug!(
                    connection_id = %connection_id,
                    bytes = data.len(),
                    "Ignored binary frame (expected JSON text)"
                );
            }
            Ok(Message::Pong(_)) => {
                let _ = pong_tx.send(());
            }
            Ok(Message::Ping(data)) => {
                let _ = tx.send(Message::Pong(data));
            }
            Ok(Message::Close(frame)) => {
                tracing::debug!(connection_id = %connection_id, reason = ?frame, "Client initiated close");
                return Exit::ClientClosed;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                return Exit::ReceiveError;
            }
        }
    }
    Exit::StreamEnded
}

/// Ping on every tick and give up on the peer when a pong is late.
/// Only returns once the connection should be torn down.
async fn heartbeat(
    config: Heartbeat,
    connection_id: ConnectionId,
    tx: &ConnectionSender,
    mut pongs: mpsc::UnboundedReceiver<()>,
) -> Exit {
    let mut ticks = interval(config.ping_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately; the first ping waits one full interval.
    ticks.tick().await;

    loop {
        ticks.tick().await;

        // Pongs answering an earlier ping must not satisfy this one.
        while pongs.try_recv().is_ok() {}

        if tx.send(Message::Ping(Bytes::from_static(b"hb"))).is_err() {
            return Exit::WriterGone;
        }

        if !matches!(timeout(config.pong_timeout, pongs.recv()).await, Ok(Some(()))) {
            tracing::warn!(connection_id = %connection_id, "Pong timeout, dropping connection");
            let _ = tx.send(Message::Close(Some(CloseFrame {
                code: 1001,
                reason: "Pong timeout".into(),
            })));
            return Exit::PongTimeout;
        }
    }
}
