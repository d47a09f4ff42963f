//! Daily task tracking: parsing, state, progress, reminders and reset.
//!
//! Inbound text flows through [`extractor::TextExtractor`] into
//! [`engine`], which mutates a [`store::StateStore`]. The reminder sweeps and
//! daily jobs read the same store on timers.

pub mod commands;
pub mod dispatch;
pub mod engine;
pub mod extractor;
pub mod phrases;
pub mod replies;
pub mod reminders;
pub mod reset;
pub mod store;
pub mod types;

pub use dispatch::{DeliveryReport, Dispatcher};
pub use engine::{Outcome, ProgressOutcome};
pub use extractor::{TextExtractor, TrackIntent};
pub use phrases::{FirstPhrase, PhraseCategory, PhraseChooser, RandomPhrases};
pub use reminders::{QuietHours, ReminderScheduler, TrackState};
pub use store::{MemoryStore, StateStore};
pub use types::{ListItem, MonthlyGoals, TaskList, Track, TrackProgress, UserId};
