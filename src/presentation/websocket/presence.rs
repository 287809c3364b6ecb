//! Presence Broadcaster
//!
//! Pushes the full online snapshot to every connection whenever
//! membership changes. Cost is O(connections) per change, so
//! O(connections²) across a burst of connects.

use axum::extract::ws::{Message, Utf8Bytes};

use crate::infrastructure::metrics;

use super::messages::{OnlinePerson, PresenceFrame};
use super::registry::ConnectionRegistry;

#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceBroadcaster;

impl PresenceBroadcaster {
    pub fn new() -> Self {
        Self
    }

    /// Current online set as a wire frame
    pub fn snapshot(&self, registry: &ConnectionRegistry) -> PresenceFrame {
        PresenceFrame {
            online: registry.online_set().iter().map(OnlinePerson::from).collect(),
        }
    }

    /// Send the snapshot to every registered connection, anonymous ones
    /// included. Returns how many connections accepted it.
    pub fn notify_online_people(&self, registry: &ConnectionRegistry) -> usize {
        let frame = self.snapshot(registry);
        let text: Utf8Bytes = match serde_json::to_string(&frame) {
            Ok(text) => text.into(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize presence frame");
                return 0;
            }
        };

        let delivered = registry
            .all()
            .iter()
            .filter(|c| c.send(Message::Text(text.clone())))
            .count();

        metrics::record_presence_broadcast();
        tracing::debug!(
            online = frame.online.len(),
            delivered = delivered,
            "Presence broadcast"
        );

        delivered
    }
}
