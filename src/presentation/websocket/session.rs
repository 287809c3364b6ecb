//! WebSocket Session
//!
//! Drives one connection from registration to cleanup: a writer task
//! drains the outbound queue, a routing task handles inbound messages in
//! order, and the session loop owns the heartbeat and death timers.

use std::fmt::Display;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

use crate::domain::Identity;
use crate::infrastructure::metrics;

use super::gateway::Gateway;
use super::liveness::{HeartbeatAction, LivenessMonitor};
use super::messages::ErrorFrame;
use super::registry::ConnectionHandle;

const PING_PAYLOAD: &[u8] = b"hb";

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    LivenessTimeout,
    TransportError,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::LivenessTimeout => "liveness_timeout",
            CloseReason::TransportError => "transport_error",
        }
    }
}

/// Run a connection until the peer leaves or stops answering pings.
///
/// Returns once the connection is unregistered and the transport is
/// released.
pub async fn run_session<St, Si, E>(
    gateway: Arc<Gateway>,
    identity: Option<Identity>,
    mut inbound: St,
    mut outbound: Si,
) -> CloseReason
where
    St: Stream<Item = Result<Message, E>> + Unpin + Send,
    Si: Sink<Message> + Unpin + Send + 'static,
    E: Display + Send,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let connection = gateway.connect(identity, tx);
    let connection_id = connection.id();

    // Spawn task to forward queued frames to the socket
    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if outbound.send(message).await.is_err() {
                break;
            }
        }
        let _ = outbound.close().await;
    });

    let (work_tx, work_rx) = mpsc::unbounded_channel::<Utf8Bytes>();
    tokio::spawn(route_inbound(
        Arc::clone(&gateway),
        Arc::clone(&connection),
        work_rx,
    ));

    let config = gateway.liveness_config();
    tracing::debug!(
        connection_id = %connection_id,
        staleness_bound_ms = config.worst_case_staleness().as_millis() as u64,
        "Session started"
    );
    let mut monitor = LivenessMonitor::new();
    let mut ticker = time::interval_at(
        Instant::now() + config.heartbeat_interval,
        config.heartbeat_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut heartbeat = Some(ticker);
    let mut death: Option<Pin<Box<Sleep>>> = None;

    let reason = loop {
        tokio::select! {
            frame = inbound.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = work_tx.send(text);
                }
                Some(Ok(Message::Pong(_))) => {
                    if monitor.on_pong() {
                        death = None;
                    }
                }
                // answered by the transport
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Binary(_))) => {
                    connection.send_frame(&ErrorFrame::new(
                        "malformed",
                        "binary frames are not supported",
                    ));
                }
                Some(Ok(Message::Close(_))) | None => {
                    monitor.on_transport_closed();
                    break CloseReason::PeerClosed;
                }
                Some(Err(e)) => {
                    tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                    monitor.on_transport_closed();
                    break CloseReason::TransportError;
                }
            },
            _ = next_tick(&mut heartbeat) => {
                if let HeartbeatAction::SendPing { arm_death_timer } = monitor.on_heartbeat() {
                    connection.send(Message::Ping(Bytes::from_static(PING_PAYLOAD)));
                    if arm_death_timer {
                        death = Some(Box::pin(time::sleep(config.pong_timeout)));
                    }
                }
            }
            _ = expired(&mut death) => {
                monitor.on_death_timeout();
                break CloseReason::LivenessTimeout;
            }
        }
    };

    // Cancel both timers before the connection leaves the registry
    drop(heartbeat);
    drop(death);

    gateway.disconnect(&connection_id);

    // Queued messages still get persisted; the worker exits once drained
    drop(work_tx);

    writer.abort();

    metrics::record_connection_closed(reason.as_str());
    tracing::info!(
        connection_id = %connection_id,
        user_id = ?connection.user_id(),
        reason = reason.as_str(),
        pings_sent = monitor.pings_sent(),
        "Connection closed"
    );

    reason
}

/// Route inbound texts one at a time and answer the sender
async fn route_inbound(
    gateway: Arc<Gateway>,
    connection: Arc<ConnectionHandle>,
    mut work_rx: mpsc::UnboundedReceiver<Utf8Bytes>,
) {
    while let Some(raw) = work_rx.recv().await {
        match gateway.router().route(&connection, raw.as_str()).await {
            Ok(receipt) => {
                metrics::record_message_routed("delivered");
                connection.send_frame(&receipt.to_ack());
            }
            Err(e) => {
                metrics::record_message_routed(e.code());
                tracing::debug!(
                    connection_id = %connection.id(),
                    code = e.code(),
                    error = %e,
                    "Message rejected"
                );
                connection.send_frame(&e.to_frame());
            }
        }
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn expired(death: &mut Option<Pin<Box<Sleep>>>) {
    match death {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}
