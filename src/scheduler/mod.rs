//! Background job scheduler.
//!
//! Emits the reminder sweeps, the daily reset and the morning nudge when
//! they fall due.

pub mod runner;
pub mod tasks;

pub use runner::Scheduler;
pub use tasks::{JobKind, Schedule, ScheduledJob};
