//! tasknag: a Telegram group bot that keeps people honest about their daily
//! task lists.
//!
//! Members post numbered lists in the IT and sport threads of one group,
//! report progress during the day, and get private reminders until they do.
//!
//! # Architecture
//!
//! - **Channels**: Telegram long polling behind [`channels::traits::ChannelAdapter`]
//! - **Tracking**: text extraction, per-user state, progress and reminders
//! - **Scheduler**: emits sweeps, the daily reset and the morning nudge
//! - **Runtime**: one task owns the state and handles messages and jobs in turn

pub mod channels;
pub mod config;
pub mod error;
pub mod runtime;
pub mod scheduler;
pub mod tracking;

pub use config::BotConfig;
pub use error::{BotError, Result};
pub use runtime::BotRuntime;
