//! Telegram alert delivery via the Bot API

use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

use super::{AlertSink, SendOutcome};
use crate::config::BotConfig;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends formatted alerts to the configured alert chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &BotConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            token: config.token.clone(),
            chat_id: config.alert_chat_id.clone(),
        }
    }

    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Bot API error: {} - {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl AlertSink for TelegramNotifier {
    async fn deliver(&self, text: &str) -> SendOutcome {
        match self.send_message(text).await {
            Ok(()) => {
                info!("Alert delivered");
                SendOutcome::Sent
            }
            Err(e) => {
                // Full payload so the operator can recover the alert by hand
                error!(error = %e, payload = %text, "Failed to deliver alert");
                SendOutcome::Failed
            }
        }
    }
}
