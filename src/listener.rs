//! Telegram message transport
//!
//! Long-polls the Bot API and delivers every incoming message as an
//! [`IngressEvent`] over a bounded channel, which gives the ingress path
//! backpressure against storage. Handles:
//! - auto-reconnect with a fixed retry delay
//! - flood-wait backoff (429 `retry_after` sleeps instead of erroring)
//! - connection status for the health surface
//!
//! Only retry exhaustion is surfaced to the orchestrator, as an
//! irrecoverable transport failure.

use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::error::{AppError, AppResult};

const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// One incoming chat message as the pipeline consumes it.
#[derive(Debug, Clone)]
pub struct IngressEvent {
    pub text: String,
    pub chat_id: i64,
    pub message_id: i64,
    pub is_forwarded: bool,
}

/// Shared connection flag read by the health endpoint.
#[derive(Clone)]
pub struct TransportStatus(Arc<AtomicBool>);

impl TransportStatus {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::Relaxed);
    }
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<IncomingMessage>,
    #[serde(default)]
    channel_post: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    message_id: i64,
    chat: ChatRef,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    forward_origin: Option<serde_json::Value>,
    #[serde(default)]
    forward_date: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChatRef {
    id: i64,
}

enum Poll {
    Updates(Vec<Update>),
    FloodWait(u64),
}

/// Bot API long-polling listener.
pub struct TelegramListener {
    client: reqwest::Client,
    token: String,
    status: TransportStatus,
    events: mpsc::Sender<IngressEvent>,
}

impl TelegramListener {
    pub fn new(config: &BotConfig, events: mpsc::Sender<IngressEvent>) -> Self {
        // Client timeout must outlast the server-side long-poll window
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token: config.token.clone(),
            status: TransportStatus::new(),
            events,
        }
    }

    /// Handle for the health surface.
    pub fn status(&self) -> TransportStatus {
        self.status.clone()
    }

    /// Poll until cancelled. Returns an error only after too many
    /// consecutive connection failures.
    pub async fn run(self, cancel: CancellationToken) -> AppResult<()> {
        info!("Listener started, monitoring all incoming messages");

        let mut offset: i64 = 0;
        let mut failures: u32 = 0;

        loop {
            let poll = tokio::select! {
                _ = cancel.cancelled() => break,
                poll = self.poll_once(offset) => poll,
            };

            match poll {
                Ok(Poll::Updates(updates)) => {
                    failures = 0;
                    self.status.set(true);

                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(event) = event_from_update(update) else {
                            continue;
                        };

                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            sent = self.events.send(event) => {
                                if sent.is_err() {
                                    // Ingress side is gone; shut down quietly
                                    self.status.set(false);
                                    return Ok(());
                                }
                            }
                        }
                    }
                }
                Ok(Poll::FloodWait(seconds)) => {
                    warn!(seconds, "Telegram flood-wait, sleeping");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                    }
                }
                Err(e) => {
                    self.status.set(false);
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        return Err(AppError::Transport(format!(
                            "giving up after {failures} consecutive poll failures: {e}"
                        )));
                    }
                    warn!(error = %e, failures, "Poll failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        self.status.set(false);
        info!("Listener stopped");
        Ok(())
    }

    async fn poll_once(&self, offset: i64) -> anyhow::Result<Poll> {
        let url = format!("https://api.telegram.org/bot{}/getUpdates", self.token);

        let response = self
            .client
            .get(&url)
            .query(&[("timeout", POLL_TIMEOUT_SECS as i64), ("offset", offset)])
            .send()
            .await?;

        let status = response.status();
        let body: UpdatesResponse = response.json().await?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = body
                .parameters
                .and_then(|p| p.retry_after)
                .unwrap_or(RETRY_DELAY.as_secs());
            return Ok(Poll::FloodWait(retry_after));
        }

        if !body.ok {
            anyhow::bail!(
                "Bot API error: {} - {}",
                status,
                body.description.unwrap_or_default()
            );
        }

        Ok(Poll::Updates(body.result))
    }
}

/// Flatten one Bot API update into an ingress event. Updates without text
/// are dropped here.
fn event_from_update(update: Update) -> Option<IngressEvent> {
    let message = update.message.or(update.channel_post)?;
    let text = message.text?;
    if text.is_empty() {
        return None;
    }

    let is_forwarded = message.forward_origin.is_some() || message.forward_date.is_some();

    Some(IngressEvent {
        text,
        chat_id: message.chat.id,
        message_id: message.message_id,
        is_forwarded,
    })
}
