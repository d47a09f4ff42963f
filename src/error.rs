//! Error types for the tasknag bot.
//!
//! Delivery failures have their own type,
//! [`crate::channels::traits::DeliveryError`], since callers branch on them.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration error (bad value, unreadable file, invalid pattern).
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BotError>;
