//! Shared helpers for integration tests.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasknag::channels::traits::{
    ChannelAdapter, ChannelInboundMessage, ChannelOutboundMessage, DeliveryError,
};
use tasknag::tracking::{Dispatcher, FirstPhrase, MemoryStore};
use tasknag::{BotConfig, BotRuntime};
use tokio::sync::mpsc;

/// Group id from the default configuration.
pub(crate) const GROUP: i64 = -1_003_401_230_283;
pub(crate) const IT_TOPIC: i64 = 4;
pub(crate) const SPORT_TOPIC: i64 = 6;
pub(crate) const MONTHLY_TOPIC: i64 = 130;

/// Adapter that records every outbound message.
///
/// Recipients in `blocked` fail as unreachable, like a user who blocked the
/// bot.
#[derive(Default)]
pub(crate) struct RecordingAdapter {
    sent: Mutex<Vec<ChannelOutboundMessage>>,
    blocked: Mutex<HashSet<i64>>,
}

impl RecordingAdapter {
    pub(crate) fn block(&self, user: i64) {
        self.blocked.lock().unwrap().insert(user);
    }

    /// Drain everything sent so far.
    pub(crate) fn take(&self) -> Vec<ChannelOutboundMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Drain and keep only private messages to `user`.
    pub(crate) fn take_for(&self, user: i64) -> Vec<String> {
        self.take()
            .into_iter()
            .filter(|m| m.chat_id == user)
            .map(|m| m.text)
            .collect()
    }
}

#[async_trait]
impl ChannelAdapter for RecordingAdapter {
    fn id(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: ChannelOutboundMessage) -> Result<(), DeliveryError> {
        if self.blocked.lock().unwrap().contains(&message.chat_id) {
            return Err(DeliveryError::RecipientUnreachable {
                recipient: message.chat_id,
                reason: "Forbidden: bot was blocked by the user".to_owned(),
            });
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn run(&self, inbound_tx: mpsc::Sender<ChannelInboundMessage>) -> anyhow::Result<()> {
        inbound_tx.closed().await;
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Runtime over an in-memory store with deterministic phrases and no pacing.
pub(crate) fn runtime() -> (BotRuntime<MemoryStore>, Arc<RecordingAdapter>) {
    let adapter = Arc::new(RecordingAdapter::default());
    let dispatcher = Dispatcher::new(adapter.clone()).with_pacing(Duration::ZERO);
    let runtime = BotRuntime::new(
        &BotConfig::default(),
        MemoryStore::new(),
        dispatcher,
        Arc::new(FirstPhrase),
    )
    .expect("runtime builds");
    (runtime, adapter)
}

/// A message posted in a group thread.
pub(crate) fn in_thread(user: i64, thread: i64, text: &str) -> ChannelInboundMessage {
    ChannelInboundMessage {
        sender_id: user,
        sender_name: Some(format!("@user{user}")),
        chat_id: GROUP,
        thread_id: Some(thread),
        message_id: Some(1000 + user),
        text: text.to_owned(),
    }
}

/// A private message to the bot.
pub(crate) fn private(user: i64, text: &str) -> ChannelInboundMessage {
    ChannelInboundMessage {
        sender_id: user,
        sender_name: Some(format!("@user{user}")),
        chat_id: user,
        thread_id: None,
        message_id: Some(1),
        text: text.to_owned(),
    }
}

/// Local wall-clock time at the default +5h offset.
pub(crate) fn local(day: u32, hour: u32, min: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2026, 3, day, hour, min, 0)
        .unwrap()
}

pub(crate) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}
