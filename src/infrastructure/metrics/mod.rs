//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active WebSocket connections, by authentication state
//! - Presence snapshots broadcast
//! - Inbound chat messages, by routing outcome
//! - Connections terminated, by reason

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("direct_chat"),
        &["state"], // "authenticated", "anonymous"
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Presence snapshots sent, counted per broadcast (not per recipient)
pub static PRESENCE_BROADCASTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "presence_broadcasts_total",
            "Number of online-set snapshots broadcast",
        )
        .namespace("direct_chat"),
    )
    .expect("Failed to create PRESENCE_BROADCASTS_TOTAL metric")
});

/// Inbound chat messages by outcome
pub static MESSAGES_ROUTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_routed_total", "Inbound chat messages by outcome")
            .namespace("direct_chat"),
        &["outcome"],
    )
    .expect("Failed to create MESSAGES_ROUTED_TOTAL metric")
});

/// Connections ended, by reason
pub static CONNECTIONS_CLOSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("connections_closed_total", "WebSocket connections ended")
            .namespace("direct_chat"),
        &["reason"], // "peer_closed", "liveness_timeout", "transport_error"
    )
    .expect("Failed to create CONNECTIONS_CLOSED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(PRESENCE_BROADCASTS_TOTAL.clone()))
        .expect("Failed to register PRESENCE_BROADCASTS_TOTAL");
    registry
        .register(Box::new(MESSAGES_ROUTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_ROUTED_TOTAL");
    registry
        .register(Box::new(CONNECTIONS_CLOSED_TOTAL.clone()))
        .expect("Failed to register CONNECTIONS_CLOSED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to update WebSocket connection counts
pub fn set_websocket_connections(authenticated: usize, anonymous: usize) {
    WEBSOCKET_CONNECTIONS_ACTIVE
        .with_label_values(&["authenticated"])
        .set(authenticated as i64);
    WEBSOCKET_CONNECTIONS_ACTIVE
        .with_label_values(&["anonymous"])
        .set(anonymous as i64);
}

pub fn record_presence_broadcast() {
    PRESENCE_BROADCASTS_TOTAL.inc();
}

pub fn record_message_routed(outcome: &str) {
    MESSAGES_ROUTED_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_connection_closed(reason: &str) {
    CONNECTIONS_CLOSED_TOTAL.with_label_values(&[reason]).inc();
}
