//! Connection Registry
//!
//! In-memory set of live connections, indexed by user for fan-out.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::Identity;

pub type ConnectionId = Uuid;

/// One live WebSocket connection
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    identity: Option<Identity>,
    sender: mpsc::UnboundedSender<Message>,
    connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    pub fn new(identity: Option<Identity>, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            sender,
            connected_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Identity attached at the handshake, `None` for anonymous connections
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|i| i.user_id)
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Queue a frame for the writer task. Returns false once the writer is gone.
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }

    /// Serialize and queue a JSON text frame
    pub fn send_frame<T: Serialize>(&self, frame: &T) -> bool {
        match serde_json::to_string(frame) {
            Ok(text) => self.send(Message::Text(text.into())),
            Err(e) => {
                tracing::error!(connection_id = %self.id, error = %e, "Failed to serialize frame");
                false
            }
        }
    }
}

/// Registry of every live connection
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Active connections by id
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User ID to connection IDs mapping (one user can hold several connections)
    user_connections: DashMap<i64, Vec<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection
    pub fn add(&self, connection: Arc<ConnectionHandle>) {
        let id = connection.id();
        if let Some(user_id) = connection.user_id() {
            self.user_connections.entry(user_id).or_default().push(id);
        }
        self.connections.insert(id, connection);
    }

    /// Unregister a connection. Returns it if it was still registered.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, connection) = self.connections.remove(id)?;

        if let Some(user_id) = connection.user_id() {
            if let Some(mut ids) = self.user_connections.get_mut(&user_id) {
                ids.retain(|c| c != id);
            }
            self.user_connections.remove_if(&user_id, |_, ids| ids.is_empty());
        }

        Some(connection)
    }

    /// Snapshot of every registered connection
    pub fn all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.iter().map(|c| Arc::clone(c.value())).collect()
    }

    /// Every connection belonging to `user_id`
    pub fn by_user(&self, user_id: i64) -> Vec<Arc<ConnectionHandle>> {
        let ids = match self.user_connections.get(&user_id) {
            Some(ids) => ids.value().clone(),
            None => return Vec::new(),
        };

        ids.iter()
            .filter_map(|id| self.connections.get(id).map(|c| Arc::clone(c.value())))
            .collect()
    }

    /// Distinct identities with at least one live connection, ordered by username
    pub fn online_set(&self) -> Vec<Identity> {
        let distinct: BTreeSet<(String, i64)> = self
            .connections
            .iter()
            .filter_map(|c| {
                c.value()
                    .identity()
                    .map(|i| (i.username.clone(), i.user_id))
            })
            .collect();

        distinct
            .into_iter()
            .map(|(username, user_id)| Identity::new(user_id, username))
            .collect()
    }

    pub fn is_user_online(&self, user_id: i64) -> bool {
        self.user_connections.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// (authenticated, anonymous) connection counts
    pub fn counts(&self) -> (usize, usize) {
        let authenticated = self
            .connections
            .iter()
            .filter(|c| c.value().identity().is_some())
            .count();
        (authenticated, self.connections.len() - authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn connect(
        registry: &ConnectionRegistry,
        identity: Option<Identity>,
    ) -> (Arc<ConnectionHandle>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Arc::new(ConnectionHandle::new(identity, tx));
        registry.add(Arc::clone(&handle));
        (handle, rx)
    }

    #[test]
    fn test_by_user_returns_every_device() {
        let registry = ConnectionRegistry::new();
        let (phone, _rx1) = connect(&registry, Some(Identity::new(1, "alice")));
        let (laptop, _rx2) = connect(&registry, Some(Identity::new(1, "alice")));
        let (_bob, _rx3) = connect(&registry, Some(Identity::new(2, "bob")));

        let mut ids: Vec<_> = registry.by_user(1).iter().map(|c| c.id()).collect();
        ids.sort();
        let mut expected = vec![phone.id(), laptop.id()];
        expected.sort();

        assert_eq!(ids, expected);
        assert!(registry.by_user(3).is_empty());
    }

    #[test]
    fn test_online_set_is_distinct_and_skips_anonymous() {
        let registry = ConnectionRegistry::new();
        let _a = connect(&registry, Some(Identity::new(2, "bob")));
        let _b = connect(&registry, Some(Identity::new(1, "alice")));
        let _c = connect(&registry, Some(Identity::new(1, "alice")));
        let _d = connect(&registry, None);

        assert_eq!(
            registry.online_set(),
            vec![Identity::new(1, "alice"), Identity::new(2, "bob")]
        );
        assert_eq!(registry.counts(), (3, 1));
    }

    #[test]
    fn test_remove_drops_user_index_with_last_connection() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = connect(&registry, Some(Identity::new(1, "alice")));
        let (second, _rx2) = connect(&registry, Some(Identity::new(1, "alice")));

        assert!(registry.remove(&first.id()).is_some());
        assert!(registry.is_user_online(1));

        assert!(registry.remove(&second.id()).is_some());
        assert!(!registry.is_user_online(1));
        assert!(registry.is_empty());

        // second removal is a no-op
        assert!(registry.remove(&second.id()).is_none());
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let registry = ConnectionRegistry::new();
        let (handle, rx) = connect(&registry, None);
        assert!(handle.send(Message::Text("x".into())));
        drop(rx);
        assert!(!handle.send(Message::Text("y".into())));
    }

    #[tokio::test]
    async fn test_concurrent_connect_disconnect() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut tasks = Vec::new();

        for n in 0..64i64 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let (tx, _rx) = mpsc::unbounded_channel();
                let handle = Arc::new(ConnectionHandle::new(
                    Some(Identity::new(n % 4, format!("user{}", n % 4))),
                    tx,
                ));
                registry.add(Arc::clone(&handle));
                if n % 2 == 0 {
                    registry.remove(&handle.id());
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.len(), 32);
        let online: Vec<i64> = registry.online_set().iter().map(|i| i.user_id).collect();
        assert_eq!(online, vec![1, 3]);
    }
}
