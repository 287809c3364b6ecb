//! Health Handlers
//!
//! `/health` and `/health/live` answer as long as the process serves
//! requests. `/health/ready` also checks the message store and reports
//! what the gateway currently holds.

use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use sqlx::PgPool;

use crate::startup::AppState;

static STARTED: Lazy<(Instant, DateTime<Utc>)> = Lazy::new(|| (Instant::now(), Utc::now()));

/// A store round-trip slower than this marks readiness as degraded
const SLOW_STORE: Duration = Duration::from_millis(100);

/// Pin the start time; uptime is measured from the first call.
pub fn init_server_start() {
    Lazy::force(&STARTED);
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub store: StoreCheck,
    pub gateway: GatewayCheck,
}

/// Where users and messages live and whether it answers
#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub backend: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Live connection counts
#[derive(Debug, Serialize)]
pub struct GatewayCheck {
    pub connections: usize,
    pub anonymous: usize,
    pub online_users: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "alive" }))
}

/// 200 while the message store answers, 503 otherwise
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store = match &state.db {
        Some(pool) => check_postgres(pool).await,
        None => StoreCheck {
            backend: "memory",
            status: HealthStatus::Healthy,
            latency_ms: None,
            error: None,
        },
    };

    let registry = state.gateway.registry();
    let (authenticated, anonymous) = registry.counts();
    let gateway = GatewayCheck {
        connections: authenticated + anonymous,
        anonymous,
        online_users: registry.online_set().len(),
    };

    let (started, started_at) = &*STARTED;
    let response = ReadinessResponse {
        status: store.status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: started.elapsed().as_secs(),
        started_at: started_at.to_rfc3339(),
        checks: ReadinessChecks { store, gateway },
    };

    (status_code(response.status), Json(response))
}

async fn check_postgres(pool: &PgPool) -> StoreCheck {
    let start = Instant::now();
    let result = sqlx::query("SELECT 1").execute(pool).await;
    let elapsed = start.elapsed();

    match result {
        Ok(_) => StoreCheck {
            backend: "postgres",
            status: store_status(elapsed),
            latency_ms: Some(elapsed.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check could not reach the database");
            StoreCheck {
                backend: "postgres",
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    }
}

fn store_status(latency: Duration) -> HealthStatus {
    if latency < SLOW_STORE {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

fn status_code(status: HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}
