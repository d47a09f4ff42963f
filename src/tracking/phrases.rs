//! Pluggable selection of flavour phrases for replies and reminders.

use rand::seq::SliceRandom;

/// Kinds of flavour phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseCategory {
    /// Reply to a completed track.
    Praise,
    /// Reply or reminder while a list is partly done.
    KeepGoing,
    /// Reminder to someone who has not started.
    Nudge,
}

/// Picks one phrase for a category.
pub trait PhraseChooser: Send + Sync {
    fn choose(&self, category: PhraseCategory) -> &'static str;
}

const PRAISE: &[&str] = &[
    "Great work! Tomorrow is a new day with new tasks, so don't get too comfortable.",
    "Well done! That's how it's done.",
    "Nice! Everything crossed off.",
];

const KEEP_GOING: &[&str] = &[
    "Keep it up! 💪",
    "Don't slow down now! 💪",
    "Halfway heroes still have to finish. Keep going!",
];

const NUDGE: &[&str] = &[
    "The list won't do itself.",
    "Time to get moving!",
    "Small steps still count. Start one now.",
];

fn phrases(category: PhraseCategory) -> &'static [&'static str] {
    match category {
        PhraseCategory::Praise => PRAISE,
        PhraseCategory::KeepGoing => KEEP_GOING,
        PhraseCategory::Nudge => NUDGE,
    }
}

/// Uniformly random choice from the built-in phrase lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPhrases;

impl PhraseChooser for RandomPhrases {
    fn choose(&self, category: PhraseCategory) -> &'static str {
        phrases(category)
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
    }
}

/// Always the first built-in phrase. Deterministic, for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPhrase;

impl PhraseChooser for FirstPhrase {
    fn choose(&self, category: PhraseCategory) -> &'static str {
        phrases(category).first().copied().unwrap_or_default()
    }
}
