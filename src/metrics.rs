//! Prometheus metrics for Alpha Radar
//!
//! Exposes a metrics endpoint for monitoring:
//! - messages processed counter
//! - mentions recorded counters (split inserted / duplicate)
//! - alerts emitted counter
//! - trending candidate and cooldown map gauges

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics state
pub struct MetricsState {
    /// Prometheus registry
    registry: Registry,
    /// Total messages processed
    pub messages_total: IntCounter,
    /// Mentions recorded as new rows
    pub mentions_inserted: IntCounter,
    /// Mentions dropped as duplicates
    pub mentions_duplicate: IntCounter,
    /// Alerts emitted
    pub alerts_total: IntCounter,
    /// Trending candidates in the latest scan
    pub trending_candidates: IntGauge,
    /// Live entries in the cooldown map
    pub cooldown_entries: IntGauge,
}

impl MetricsState {
    /// Create a new metrics state with all metrics registered
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_total = IntCounter::with_opts(Opts::new(
            "radar_messages_total",
            "Total messages processed",
        ))
        .expect("Failed to create messages_total counter");
        registry
            .register(Box::new(messages_total.clone()))
            .expect("Failed to register messages_total");

        let mentions_inserted = IntCounter::with_opts(Opts::new(
            "radar_mentions_inserted_total",
            "Contract mentions recorded as new rows",
        ))
        .expect("Failed to create mentions_inserted counter");
        registry
            .register(Box::new(mentions_inserted.clone()))
            .expect("Failed to register mentions_inserted");

        let mentions_duplicate = IntCounter::with_opts(Opts::new(
            "radar_mentions_duplicate_total",
            "Contract mentions dropped as duplicates",
        ))
        .expect("Failed to create mentions_duplicate counter");
        registry
            .register(Box::new(mentions_duplicate.clone()))
            .expect("Failed to register mentions_duplicate");

        let alerts_total =
            IntCounter::with_opts(Opts::new("radar_alerts_total", "Total alerts emitted"))
                .expect("Failed to create alerts_total counter");
        registry
            .register(Box::new(alerts_total.clone()))
            .expect("Failed to register alerts_total");

        let trending_candidates = IntGauge::with_opts(Opts::new(
            "radar_trending_candidates",
            "Trending candidates in the latest scan",
        ))
        .expect("Failed to create trending_candidates gauge");
        registry
            .register(Box::new(trending_candidates.clone()))
            .expect("Failed to register trending_candidates");

        let cooldown_entries = IntGauge::with_opts(Opts::new(
            "radar_cooldown_entries",
            "Live entries in the alert cooldown map",
        ))
        .expect("Failed to create cooldown_entries gauge");
        registry
            .register(Box::new(cooldown_entries.clone()))
            .expect("Failed to register cooldown_entries");

        Self {
            registry,
            messages_total,
            mentions_inserted,
            mentions_duplicate,
            alerts_total,
            trending_candidates,
            cooldown_entries,
        }
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics handler - returns Prometheus metrics in text format
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.registry().gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
}

/// Create metrics router
pub fn metrics_router() -> Router<Arc<MetricsState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
