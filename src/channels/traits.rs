use async_trait::async_trait;
use tokio::sync::mpsc;

/// Inbound text message received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInboundMessage {
    /// Author of the message.
    pub sender_id: i64,
    /// Author's display name, if the transport supplied one.
    pub sender_name: Option<String>,
    /// Chat the message was posted in. Equals `sender_id` for private chats.
    pub chat_id: i64,
    /// Forum thread inside a group, if any.
    pub thread_id: Option<i64>,
    /// Transport message id, used to reply in-thread.
    pub message_id: Option<i64>,
    pub text: String,
}

/// Outbound message for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutboundMessage {
    pub chat_id: i64,
    /// Forum thread to post into.
    pub thread_id: Option<i64>,
    /// Message to quote.
    pub reply_to: Option<i64>,
    pub text: String,
}

impl ChannelOutboundMessage {
    /// Plain message to a user's private chat.
    pub fn direct(user: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id: user,
            thread_id: None,
            reply_to: None,
            text: text.into(),
        }
    }

    /// Reply in the same chat and thread as `inbound`, quoting it.
    pub fn reply_to(inbound: &ChannelInboundMessage, text: impl Into<String>) -> Self {
        Self {
            chat_id: inbound.chat_id,
            thread_id: inbound.thread_id,
            reply_to: inbound.message_id,
            text: text.into(),
        }
    }
}

/// Why an outbound message was not delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The recipient blocked the bot or never opened a chat with it.
    #[error("recipient {recipient} unreachable: {reason}")]
    RecipientUnreachable { recipient: i64, reason: String },

    /// Any other transport failure (network, rate limit, server error).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl DeliveryError {
    #[must_use]
    pub fn is_recipient_unreachable(&self) -> bool {
        matches!(self, Self::RecipientUnreachable { .. })
    }
}

/// Chat transport contract. The bot only needs send, receive and a probe.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Stable transport identifier (e.g. `telegram`).
    fn id(&self) -> &'static str;

    /// Deliver one message.
    async fn send(&self, message: ChannelOutboundMessage) -> Result<(), DeliveryError>;

    /// Receive inbound messages and forward them until the transport stops.
    async fn run(&self, inbound_tx: mpsc::Sender<ChannelInboundMessage>) -> anyhow::Result<()>;

    /// Best-effort health probe.
    async fn health_check(&self) -> anyhow::Result<bool>;
}
