//! Applies recognised intents to tracking state.
//!
//! Every function here finishes its mutation before returning, so callers
//! can send replies afterwards without observing a half-updated record.

use crate::tracking::extractor::TrackIntent;
use crate::tracking::store::StateStore;
use crate::tracking::types::{MonthlyGoals, TaskList, Track, UserId};
use chrono::NaiveDate;
use tracing::info;

/// Result of a progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// The track has no list yet. Nothing changed.
    NeedsListFirst,
    /// No completed-count could be read from the message. Nothing changed.
    NeedsCount,
    /// Report recorded.
    Recorded {
        completed: u32,
        remaining: u32,
        total: u32,
        /// The report exhausted the list and marked the track completed.
        auto_completed: bool,
    },
}

/// Result of applying one [`TrackIntent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    ListSet { total: u32 },
    Completed,
    Progress(ProgressOutcome),
}

/// Apply `intent` for `user` on `track`.
pub fn apply<S: StateStore>(
    store: &mut S,
    user: UserId,
    track: Track,
    intent: TrackIntent,
    today: NaiveDate,
) -> Outcome {
    match intent {
        TrackIntent::List(list) => Outcome::ListSet {
            total: set_task_list(store, user, track, list),
        },
        TrackIntent::Completion => {
            record_completion(store, user, track, today);
            Outcome::Completed
        }
        TrackIntent::Progress { completed } => {
            Outcome::Progress(record_progress(store, user, track, completed, today))
        }
    }
}

/// Replace the current list and rearm `remaining` to its total.
///
/// Leaves `wrote_progress_today` untouched. Returns the new total.
pub fn set_task_list<S: StateStore>(
    store: &mut S,
    user: UserId,
    track: Track,
    list: TaskList,
) -> u32 {
    let total = list.total();
    let progress = store.progress_entry(user, track);
    progress.task_list = list;
    progress.remaining = total;
    info!(user, %track, total, "task list set");
    total
}

/// Mark `track` completed today regardless of `remaining`.
pub fn record_completion<S: StateStore>(
    store: &mut S,
    user: UserId,
    track: Track,
    today: NaiveDate,
) {
    store.mark_completed(user, track, today);
    info!(user, %track, %today, "track completed");
}

/// Record a partial completed-count.
pub fn record_progress<S: StateStore>(
    store: &mut S,
    user: UserId,
    track: Track,
    completed: Option<u32>,
    today: NaiveDate,
) -> ProgressOutcome {
    let total = store.progress(user, track).map_or(0, |p| p.total());
    if total == 0 {
        return ProgressOutcome::NeedsListFirst;
    }
    let Some(completed) = completed else {
        return ProgressOutcome::NeedsCount;
    };

    let remaining = total.saturating_sub(completed);
    let progress = store.progress_entry(user, track);
    progress.remaining = remaining;
    progress.wrote_progress_today = true;
    progress.last_progress_date = Some(today);

    let mut auto_completed = false;
    if remaining == 0 {
        auto_completed = store.completed_on(user, track) != Some(today);
        store.mark_completed(user, track, today);
    }

    info!(
        user,
        %track,
        completed,
        total,
        remaining,
        auto_completed,
        "progress report recorded"
    );
    ProgressOutcome::Recorded {
        completed,
        remaining,
        total,
        auto_completed,
    }
}

/// Replace the user's monthly goals. Returns the goal count.
pub fn set_goals<S: StateStore>(
    store: &mut S,
    user: UserId,
    goals: TaskList,
    today: NaiveDate,
) -> usize {
    let count = goals.len();
    store.set_goals(
        user,
        MonthlyGoals {
            goals,
            created_date: today,
        },
    );
    info!(user, count, "monthly goals set");
    count
}
