//! Top-level orchestrator
//!
//! Wires listener -> detectors -> storage -> trending -> notifier and owns
//! the process lifecycle: the ingress path, the periodic trending and
//! retention loops, the HTTP surfaces and cooperative shutdown.

use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, FilterConfig, TrendingConfig};
use crate::cooldown::CooldownGate;
use crate::detectors::DetectorRegistry;
use crate::error::{AppError, AppResult};
use crate::handlers::{health_router, HealthState};
use crate::listener::{IngressEvent, TelegramListener};
use crate::metrics::{metrics_router, MetricsState};
use crate::notifier::{format_alert, AlertSink, SendOutcome, TelegramNotifier};
use crate::oracle::{DexscreenerOracle, LiquidityOracle};
use crate::storage::{MentionStore, PostgresRepository, RecordOutcome};
use crate::trending::TrendingEngine;

/// Buffered ingress events; when storage slows down, message delivery
/// slows with it instead of dropping.
const INGRESS_BUFFER: usize = 256;

/// Mentions older than this are purged
const RETENTION_HOURS: i64 = 24;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// The assembled application.
pub struct AlphaRadar {
    config: AppConfig,
    dry_run: bool,
}

impl AlphaRadar {
    pub fn new(config: AppConfig, dry_run: bool) -> Self {
        Self { config, dry_run }
    }

    /// Start every component and block until shutdown.
    ///
    /// Errors raised here before the background tasks spawn are startup
    /// failures; afterwards only an exhausted transport surfaces, as a
    /// runtime failure.
    pub async fn run(self) -> AppResult<()> {
        let AlphaRadar { config, dry_run } = self;

        let cancel = CancellationToken::new();

        let store: Arc<dyn MentionStore> =
            Arc::new(PostgresRepository::connect(&config.database).await?);
        let registry = Arc::new(DetectorRegistry::with_builtin_detectors());
        let metrics = Arc::new(MetricsState::new());

        info!(
            detectors = ?registry.chain_names(),
            dry_run,
            "Alpha Radar starting"
        );

        let (events_tx, events_rx) = mpsc::channel::<IngressEvent>(INGRESS_BUFFER);
        let listener = TelegramListener::new(&config.bot, events_tx);
        let transport = listener.status();

        let oracle: Option<Arc<dyn LiquidityOracle>> = if config.dexscreener.enabled {
            info!(
                min_liquidity = config.dexscreener.min_liquidity,
                "Liquidity filter enabled"
            );
            Some(Arc::new(DexscreenerOracle::new(&config.dexscreener)))
        } else {
            None
        };

        let engine = TrendingEngine::new(store.clone(), oracle, config.trending.clone());
        let sink: Arc<dyn AlertSink> = Arc::new(TelegramNotifier::new(&config.bot));

        let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        if config.health.enabled {
            let state = Arc::new(HealthState {
                store: store.clone(),
                transport: transport.clone(),
                metrics: metrics.clone(),
                started_at: Utc::now(),
                detectors: registry.chain_names(),
            });
            tasks.push((
                "health",
                tokio::spawn(serve_health(state, config.health.port, cancel.clone())),
            ));
        }

        if config.metrics.enabled {
            tasks.push((
                "metrics",
                tokio::spawn(serve_metrics(
                    metrics.clone(),
                    config.metrics.port,
                    cancel.clone(),
                )),
            ));
        }

        tasks.push((
            "ingress",
            tokio::spawn(ingress_loop(
                events_rx,
                registry.clone(),
                config.filters.clone(),
                store.clone(),
                metrics.clone(),
                cancel.clone(),
            )),
        ));

        tasks.push((
            "trending",
            tokio::spawn(trending_loop(
                engine,
                sink,
                store.clone(),
                metrics.clone(),
                config.trending.clone(),
                dry_run,
                cancel.clone(),
            )),
        ));

        tasks.push((
            "retention",
            tokio::spawn(retention_loop(store.clone(), cancel.clone())),
        ));

        let mut listener_task = tokio::spawn(listener.run(cancel.clone()));

        let result = tokio::select! {
            _ = shutdown_signal() => {
                info!("Shutdown signal received");
                Ok(())
            }
            joined = &mut listener_task => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    error!(error = %e, "Transport failed");
                    Err(e)
                }
                Err(e) => Err(AppError::Transport(format!("listener task panicked: {e}"))),
            },
        };

        cancel.cancel();

        if !listener_task.is_finished() {
            let _ = listener_task.await;
        }
        for (name, task) in tasks {
            if task.await.is_err() {
                warn!(task = name, "Background task aborted");
            }
        }

        store.close().await;
        info!("Shutdown complete");
        result
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Consume ingress events until cancellation or transport disconnect.
async fn ingress_loop(
    mut events: mpsc::Receiver<IngressEvent>,
    registry: Arc<DetectorRegistry>,
    filters: FilterConfig,
    store: Arc<dyn MentionStore>,
    metrics: Arc<MetricsState>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        handle_event(event, &registry, &filters, store.as_ref(), &metrics).await;
    }
}

/// Process one incoming message through every detector. All resulting
/// repository writes complete before this returns.
async fn handle_event(
    event: IngressEvent,
    registry: &DetectorRegistry,
    filters: &FilterConfig,
    store: &dyn MentionStore,
    metrics: &MetricsState,
) {
    metrics.messages_total.inc();

    if !passes_prefilters(filters, &event) {
        return;
    }

    for m in registry.detect_all(&event.text, event.chat_id, event.message_id) {
        match store.record_mention(&m).await {
            Ok(RecordOutcome::Inserted) => {
                metrics.mentions_inserted.inc();
                info!(
                    contract = %m.contract,
                    chain = %m.chain,
                    chat_id = m.chat_id,
                    "New mention recorded"
                );
            }
            Ok(RecordOutcome::Duplicate) => {
                metrics.mentions_duplicate.inc();
            }
            Err(e) => {
                warn!(error = %e, contract = %m.contract, "Failed to record mention, dropping");
            }
        }
    }
}

fn passes_prefilters(filters: &FilterConfig, event: &IngressEvent) -> bool {
    if event.text.chars().count() < filters.min_msg_length {
        return false;
    }
    if filters.ignore_forwarded && event.is_forwarded {
        return false;
    }
    true
}

/// Periodic trending scan and cooldown-gated alerting.
async fn trending_loop(
    engine: TrendingEngine,
    sink: Arc<dyn AlertSink>,
    store: Arc<dyn MentionStore>,
    metrics: Arc<MetricsState>,
    config: TrendingConfig,
    dry_run: bool,
    cancel: CancellationToken,
) {
    let mut gate = CooldownGate::new(chrono::Duration::minutes(config.cooldown_minutes));
    let mut interval = tokio::time::interval(Duration::from_secs(config.check_interval));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                run_trending_cycle(
                    &engine,
                    sink.as_ref(),
                    store.as_ref(),
                    &metrics,
                    &mut gate,
                    config.window_minutes,
                    dry_run,
                )
                .await;
            }
        }
    }
}

async fn run_trending_cycle(
    engine: &TrendingEngine,
    sink: &dyn AlertSink,
    store: &dyn MentionStore,
    metrics: &MetricsState,
    gate: &mut CooldownGate,
    window_minutes: i64,
    dry_run: bool,
) {
    let tokens = match engine.scan().await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "Trending scan failed, retrying next tick");
            return;
        }
    };

    metrics.trending_candidates.set(tokens.len() as i64);

    for token in &tokens {
        if !gate.admit(&token.contract) {
            debug!(contract = %token.contract, "On cooldown, skipping alert");
            continue;
        }

        let text = format_alert(token, window_minutes);
        let delivered = if dry_run {
            info!(contract = %token.contract, payload = %text, "Dry-run, alert withheld");
            true
        } else {
            matches!(sink.deliver(&text).await, SendOutcome::Sent)
        };

        // History is appended only after a successful (or withheld) send,
        // so a failed delivery leaves no phantom audit row.
        if delivered {
            metrics.alerts_total.inc();
            if let Err(e) = store.record_alert(token, Utc::now()).await {
                warn!(error = %e, contract = %token.contract, "Failed to append alert history");
            }
        }
    }

    gate.prune();
    metrics.cooldown_entries.set(gate.len() as i64);
}

/// Hourly purge of mentions past the retention horizon.
async fn retention_loop(store: Arc<dyn MentionStore>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(RETENTION_HOURS);
                if let Err(e) = store.purge_before(cutoff).await {
                    warn!(error = %e, "Retention purge failed, retrying next cycle");
                }
            }
        }
    }
}

async fn serve_health(state: Arc<HealthState>, port: u16, cancel: CancellationToken) {
    let app = health_router(state).layer(TraceLayer::new_for_http());
    serve(app, port, "health", cancel).await;
}

async fn serve_metrics(metrics: Arc<MetricsState>, port: u16, cancel: CancellationToken) {
    let app = metrics_router()
        .with_state(metrics)
        .layer(TraceLayer::new_for_http());
    serve(app, port, "metrics", cancel).await;
}

async fn serve(app: axum::Router, port: u16, name: &'static str, cancel: CancellationToken) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, server = name, "Failed to bind HTTP server");
            return;
        }
    };

    info!(%addr, server = name, "HTTP server listening");

    let shutdown = async move { cancel.cancelled().await };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error = %e, server = name, "HTTP server error");
    }
}
