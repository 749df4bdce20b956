//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::listener::TransportStatus;
use crate::metrics::MetricsState;
use crate::storage::MentionStore;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded"
    pub status: &'static str,
    pub details: HealthDetails,
}

#[derive(Debug, Serialize)]
pub struct HealthDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub uptime_seconds: i64,
    pub messages_processed: u64,
    pub mentions_recorded: u64,
    pub alerts_sent: u64,
    pub db_connected: bool,
    pub telegram_connected: bool,
    pub detectors: Vec<&'static str>,
}

/// Shared application state for health checks
pub struct HealthState {
    pub store: Arc<dyn MentionStore>,
    pub transport: TransportStatus,
    pub metrics: Arc<MetricsState>,
    pub started_at: DateTime<Utc>,
    pub detectors: Vec<&'static str>,
}

/// Health check handler
///
/// GET /health
pub async fn health_check(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let db_connected = state.store.is_healthy().await;
    let telegram_connected = state.transport.is_connected();

    let (status, code, reason) = summarize(db_connected, telegram_connected);

    let response = HealthResponse {
        status,
        details: HealthDetails {
            reason,
            uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
            messages_processed: state.metrics.messages_total.get(),
            mentions_recorded: state.metrics.mentions_inserted.get(),
            alerts_sent: state.metrics.alerts_total.get(),
            db_connected,
            telegram_connected,
            detectors: state.detectors.clone(),
        },
    };

    (code, Json(response))
}

fn summarize(
    db_connected: bool,
    telegram_connected: bool,
) -> (&'static str, StatusCode, Option<&'static str>) {
    match (db_connected, telegram_connected) {
        (true, true) => ("healthy", StatusCode::OK, None),
        (false, _) => (
            "degraded",
            StatusCode::SERVICE_UNAVAILABLE,
            Some("database unreachable"),
        ),
        (_, false) => (
            "degraded",
            StatusCode::SERVICE_UNAVAILABLE,
            Some("transport disconnected"),
        ),
    }
}

/// Create health router
pub fn health_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_healthy() {
        let (status, code, reason) = summarize(true, true);
        assert_eq!(status, "healthy");
        assert_eq!(code, StatusCode::OK);
        assert!(reason.is_none());
    }

    #[test]
    fn test_summarize_degraded() {
        let (status, code, reason) = summarize(false, true);
        assert_eq!(status, "degraded");
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reason, Some("database unreachable"));

        let (status, code, reason) = summarize(true, false);
        assert_eq!(status, "degraded");
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reason, Some("transport disconnected"));
    }
}
