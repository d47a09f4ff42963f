//! Outbound delivery with self-healing unsubscribe.

use crate::channels::traits::{ChannelAdapter, ChannelOutboundMessage, DeliveryError};
use crate::tracking::store::StateStore;
use crate::tracking::types::UserId;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default pause between consecutive broadcast sends.
pub const DEFAULT_PACING: Duration = Duration::from_millis(100);

/// Per-sweep delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub unsubscribed: usize,
}

impl DeliveryReport {
    fn record(&mut self, outcome: &Result<(), DeliveryError>, unsubscribed: bool) {
        match outcome {
            Ok(()) => self.sent += 1,
            Err(_) => self.failed += 1,
        }
        if unsubscribed {
            self.unsubscribed += 1;
        }
    }
}

/// Sends messages through a [`ChannelAdapter`].
///
/// Failures never propagate: they are logged, and an unreachable recipient
/// is removed from the subscription set.
#[derive(Clone)]
pub struct Dispatcher {
    adapter: Arc<dyn ChannelAdapter>,
    pacing: Duration,
}

impl Dispatcher {
    pub fn new(adapter: Arc<dyn ChannelAdapter>) -> Self {
        Self {
            adapter,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the pause between broadcast sends.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Send `text` privately to `user`.
    ///
    /// Returns whether the user was unsubscribed as a result.
    pub async fn deliver<S: StateStore>(
        &self,
        store: &mut S,
        user: UserId,
        text: String,
    ) -> (Result<(), DeliveryError>, bool) {
        let outcome = self
            .adapter
            .send(ChannelOutboundMessage::direct(user, text))
            .await;
        let mut unsubscribed = false;
        match &outcome {
            Ok(()) => debug!(user, channel = self.adapter.id(), "message delivered"),
            Err(err) if err.is_recipient_unreachable() => {
                warn!(user, "recipient unreachable: {err}");
                if store.unsubscribe(user) {
                    info!(user, "unsubscribed unreachable user");
                    unsubscribed = true;
                }
            }
            Err(err) => warn!(user, "delivery failed: {err}"),
        }
        (outcome, unsubscribed)
    }

    /// Send one message per `(user, text)` pair, pacing between sends.
    ///
    /// A failure for one recipient does not stop delivery to the rest. Once a
    /// user turns out to be unreachable, their remaining messages in the
    /// batch are dropped.
    pub async fn send_all<S: StateStore>(
        &self,
        store: &mut S,
        messages: Vec<(UserId, String)>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut unreachable: HashSet<UserId> = HashSet::new();
        let count = messages.len();
        for (index, (user, text)) in messages.into_iter().enumerate() {
            if unreachable.contains(&user) {
                debug!(user, "skipping message to unreachable user");
                continue;
            }
            let (outcome, unsubscribed) = self.deliver(store, user, text).await;
            if outcome
                .as_ref()
                .is_err_and(DeliveryError::is_recipient_unreachable)
            {
                unreachable.insert(user);
            }
            report.record(&outcome, unsubscribed);
            if index + 1 < count && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }
        report
    }

    /// Send the same `text` to every user in `recipients`.
    pub async fn broadcast<S: StateStore>(
        &self,
        store: &mut S,
        recipients: &[UserId],
        text: &str,
    ) -> DeliveryReport {
        let messages = recipients
            .iter()
            .map(|user| (*user, text.to_owned()))
            .collect();
        self.send_all(store, messages).await
    }

    /// Reply in a group thread. Failures are only logged.
    pub async fn reply(&self, message: ChannelOutboundMessage) {
        let chat = message.chat_id;
        if let Err(err) = self.adapter.send(message).await {
            warn!(chat, "failed to send reply: {err}");
        }
    }
}
