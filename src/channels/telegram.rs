use crate::channels::traits::{
    ChannelAdapter, ChannelInboundMessage, ChannelOutboundMessage, DeliveryError,
};
use crate::config::TelegramConfig;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Error descriptions meaning the recipient can never be reached.
const UNREACHABLE_MARKERS: &[&str] = &["bot was blocked", "user is deactivated"];

/// Extra time on top of the long-poll timeout before a request is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout for one-shot Bot API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram Bot API adapter using long polling.
pub struct TelegramAdapter {
    api_base: String,
    bot_token: String,
    poll_timeout_secs: u64,
    /// Next `getUpdates` offset; survives restarts of [`ChannelAdapter::run`].
    offset: AtomicI64,
    client: reqwest::Client,
}

impl TelegramAdapter {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            offset: AtomicI64::new(0),
            client: reqwest::Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Fetch one batch of updates and forward their messages.
    ///
    /// Returns `false` once the inbound receiver is gone.
    async fn poll_once(
        &self,
        inbound_tx: &mpsc::Sender<ChannelInboundMessage>,
    ) -> anyhow::Result<bool> {
        let body = json!({
            "offset": self.offset.load(Ordering::Relaxed),
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message"],
        });
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(self.poll_timeout_secs) + POLL_GRACE)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;
        if !payload
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
        {
            let description = description(&payload);
            anyhow::bail!("telegram getUpdates failed ({status}): {description}");
        }

        let updates = payload
            .get("result")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();
        for update in &updates {
            if let Some(update_id) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                self.offset.fetch_max(update_id + 1, Ordering::Relaxed);
            }
            let Some(message) = parse_update(update) else {
                continue;
            };
            if inbound_tx.send(message).await.is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn description(payload: &serde_json::Value) -> String {
    payload
        .get("description")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Parse one `getUpdates` entry into an inbound message.
///
/// Skips non-text messages and messages from bots.
#[must_use]
pub fn parse_update(update: &serde_json::Value) -> Option<ChannelInboundMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(serde_json::Value::as_str)?;
    let from = message.get("from")?;
    if from
        .get("is_bot")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
    {
        return None;
    }
    let sender_id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let chat_id = message
        .get("chat")
        .and_then(|chat| chat.get("id"))
        .and_then(serde_json::Value::as_i64)?;

    let sender_name = from
        .get("username")
        .and_then(serde_json::Value::as_str)
        .filter(|name| !name.is_empty())
        .map(|name| format!("@{name}"))
        .or_else(|| {
            from.get("first_name")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        });

    Some(ChannelInboundMessage {
        sender_id,
        sender_name,
        chat_id,
        thread_id: message
            .get("message_thread_id")
            .and_then(serde_json::Value::as_i64),
        message_id: message.get("message_id").and_then(serde_json::Value::as_i64),
        text: text.to_owned(),
    })
}

/// Map a failed `sendMessage` to a [`DeliveryError`].
#[must_use]
pub fn classify_failure(recipient: i64, description: &str) -> DeliveryError {
    let lowered = description.to_lowercase();
    if UNREACHABLE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        DeliveryError::RecipientUnreachable {
            recipient,
            reason: description.to_owned(),
        }
    } else {
        DeliveryError::Transport(description.to_owned())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn id(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: ChannelOutboundMessage) -> Result<(), DeliveryError> {
        let mut body = json!({
            "chat_id": message.chat_id,
            "text": message.text,
        });
        if let Some(thread_id) = message.thread_id {
            body["message_thread_id"] = json!(thread_id);
        }
        if let Some(reply_to) = message.reply_to {
            body["reply_to_message_id"] = json!(reply_to);
            body["allow_sending_without_reply"] = json!(true);
        }

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(chat = message.chat_id, "telegram message sent");
            return Ok(());
        }
        let payload: serde_json::Value = response.json().await.unwrap_or_default();
        let description = description(&payload);
        let description = if description.is_empty() {
            format!("telegram send failed ({status})")
        } else {
            description
        };
        Err(classify_failure(message.chat_id, &description))
    }

    async fn run(&self, inbound_tx: mpsc::Sender<ChannelInboundMessage>) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("telegram bot token is empty");
        }
        loop {
            if !self.poll_once(&inbound_tx).await? {
                warn!("inbound receiver closed, telegram polling stopped");
                return Ok(());
            }
        }
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        if self.bot_token.trim().is_empty() {
            return Ok(false);
        }
        let response = self
            .client
            .get(self.method_url("getMe"))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(response.status().is_success())
    }
}
