//! WebSocket Gateway
//!
//! Owns the connection registry and ties registration, presence and
//! routing together for the session tasks.
//!
//! Membership changes and the presence snapshot that follows them happen
//! under one lock, so snapshots leave in the order the registry changed and
//! the last one every peer receives matches the registry.

use std::sync::Arc;

use axum::extract::ws::Message;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::Identity;
use crate::infrastructure::metrics;

use super::liveness::LivenessConfig;
use super::presence::PresenceBroadcaster;
use super::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
use super::router::MessageRouter;

pub struct Gateway {
    registry: Arc<ConnectionRegistry>,
    /// Held across a registry change and its broadcast. Every send under it
    /// is a non-blocking queue push.
    broadcaster: Mutex<PresenceBroadcaster>,
    router: Arc<MessageRouter>,
    liveness: LivenessConfig,
}

impl Gateway {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        router: Arc<MessageRouter>,
        liveness: LivenessConfig,
    ) -> Self {
        Self {
            registry,
            broadcaster: Mutex::new(PresenceBroadcaster::new()),
            router,
            liveness,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    pub fn liveness_config(&self) -> LivenessConfig {
        self.liveness
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Register a new connection and announce the updated online set
    pub fn connect(
        &self,
        identity: Option<Identity>,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Arc<ConnectionHandle> {
        let connection = Arc::new(ConnectionHandle::new(identity, sender));

        let broadcaster = self.broadcaster.lock();
        self.registry.add(Arc::clone(&connection));
        self.update_gauge();
        broadcaster.notify_online_people(&self.registry);
        drop(broadcaster);

        tracing::info!(
            connection_id = %connection.id(),
            user_id = ?connection.user_id(),
            "Connection registered"
        );

        connection
    }

    /// Unregister a connection. Presence is rebroadcast only if it was
    /// still registered, so a double disconnect is a no-op.
    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        let broadcaster = self.broadcaster.lock();
        let Some(connection) = self.registry.remove(id) else {
            return false;
        };
        self.update_gauge();
        broadcaster.notify_online_people(&self.registry);
        drop(broadcaster);

        tracing::info!(
            connection_id = %id,
            user_id = ?connection.user_id(),
            connected_for_ms = (chrono::Utc::now() - connection.connected_at()).num_milliseconds(),
            "Connection unregistered"
        );
        true
    }

    fn update_gauge(&self) {
        let (authenticated, anonymous) = self.registry.counts();
        metrics::set_websocket_connections(authenticated, anonymous);
    }
}
