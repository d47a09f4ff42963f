//! Immediate replies to messages in the tracked group threads.

use crate::tracking::engine::{Outcome, ProgressOutcome};
use crate::tracking::phrases::{PhraseCategory, PhraseChooser};
use crate::tracking::types::Track;

/// Reply to an applied track intent. `who` is the sender's mention.
#[must_use]
pub fn outcome_reply(
    who: &str,
    track: Track,
    outcome: Outcome,
    phrases: &dyn PhraseChooser,
) -> String {
    match outcome {
        Outcome::ListSet { total } => format!(
            "{} {who} set a {} list of {total} {}!",
            track.icon(),
            track.label(),
            track.unit()
        ),
        Outcome::Completed => completed(who, track, phrases),
        Outcome::Progress(ProgressOutcome::NeedsListFirst) => format!(
            "⚠️ {who}, first post your list in the {} topic like this: 1. Task 1, 2. Task 2, ...",
            track.topic_name()
        ),
        Outcome::Progress(ProgressOutcome::NeedsCount) => format!(
            "🤔 {who}, how many {} did you finish? Try '{}'.",
            track.unit(),
            track.progress_example()
        ),
        Outcome::Progress(ProgressOutcome::Recorded {
            remaining: 0, ..
        }) => completed(who, track, phrases),
        Outcome::Progress(ProgressOutcome::Recorded {
            remaining, total, ..
        }) => format!(
            "✅ {who} {remaining} of {total} {} left. {}",
            track.unit(),
            phrases.choose(PhraseCategory::KeepGoing)
        ),
    }
}

fn completed(who: &str, track: Track, phrases: &dyn PhraseChooser) -> String {
    format!(
        "🎉 {who} finished all {} {} for today! {}",
        track.label(),
        track.unit(),
        phrases.choose(PhraseCategory::Praise)
    )
}

/// Reply to an accepted goals message.
#[must_use]
pub fn goals_reply(who: &str, count: usize) -> String {
    format!("🎯 {who} set {count} goals for the month! I'll remind you about them every day.")
}
