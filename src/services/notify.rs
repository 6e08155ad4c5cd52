use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{SecretString, TelegramConfig};
use crate::services::executor::ExecutionOutcome;
use crate::services::units::format_display;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SwapSummary {
    pub token_from: String,
    pub token_to: String,
    pub amount_in: Decimal,
    pub estimated_amount_out: Decimal,
    pub pool_ids: Vec<String>,
    pub sender: String,
}

/// Best-effort delivery of a finished swap. Implementations log their own
/// failures; the transaction is already on chain when this runs.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether at least one recipient received the message.
    async fn notify(&self, outcome: &ExecutionOutcome, summary: &SwapSummary) -> bool;
}

pub fn format_summary(summary: &SwapSummary, tx_hash: &str) -> String {
    format!(
        "*Swap Executed!*\n\n\
         *From:* `{from}`\n\
         *To:* `{to}`\n\
         *Amount IN:* `{amount_in} {from}`\n\
         *Amount OUT:* `{amount_out} {to}`\n\
         *Pools:* `{pools}`\n\
         *Sender:* `{sender}`\n\
         *TxHash:* `{tx_hash}`",
        from = summary.token_from,
        to = summary.token_to,
        amount_in = summary.amount_in.normalize(),
        amount_out = format_display(summary.estimated_amount_out, 6),
        pools = summary.pool_ids.join(","),
        sender = summary.sender,
        tx_hash = tx_hash,
    )
}

pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _outcome: &ExecutionOutcome, _summary: &SwapSummary) -> bool {
        debug!("Notifications disabled; skipping");
        false
    }
}

pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: SecretString,
    recipients: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            recipients: config.recipients.clone(),
        })
    }

    async fn send(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url,
            self.bot_token.expose()
        );
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        // reqwest errors carry the URL, which contains the bot token.
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| format!("request failed: {}", err.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Telegram returned status {}", status));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, outcome: &ExecutionOutcome, summary: &SwapSummary) -> bool {
        let Some(tx_hash) = outcome.tx_hash.as_deref() else {
            debug!("No transaction hash; skipping notification");
            return false;
        };
        let message = format_summary(summary, tx_hash);

        let mut delivered = 0usize;
        for chat_id in &self.recipients {
            match self.send(chat_id, &message).await {
                Ok(()) => {
                    delivered += 1;
                    info!(
                        event = "notification_sent",
                        chat_id = chat_id.as_str(),
                        "Notification sent"
                    )
                }
                Err(error) => warn!(
                    event = "notification_failed",
                    chat_id = chat_id.as_str(),
                    error = %error,
                    "Failed to send Telegram message"
                ),
            }
        }
        delivered > 0
    }
}
