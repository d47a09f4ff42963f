//! Per-user tracking state.
//!
//! [`StateStore`] is the seam the progress engine, reminder sweeps and daily
//! reset are written against; [`MemoryStore`] is the only backend. State is
//! process-local and lost on restart.
//!
//! The store is owned by a single task (see [`crate::runtime`]), so methods
//! take `&mut self` and no locking is involved.

use crate::tracking::types::{MonthlyGoals, Track, TrackProgress, UserId};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Storage contract for tracking state, keyed by user and track.
pub trait StateStore: Send {
    /// Progress for `(user, track)`, if any was ever created.
    fn progress(&self, user: UserId, track: Track) -> Option<&TrackProgress>;

    /// Progress for `(user, track)`, created empty on first access.
    fn progress_entry(&mut self, user: UserId, track: Track) -> &mut TrackProgress;

    /// Replace progress for `(user, track)`.
    fn upsert_progress(&mut self, user: UserId, track: Track, progress: TrackProgress);

    /// Drop progress for `(user, track)`.
    fn remove_progress(&mut self, user: UserId, track: Track) -> Option<TrackProgress>;

    /// Every key that currently holds progress.
    fn progress_keys(&self) -> Vec<(UserId, Track)>;

    /// Date on which `user` last completed `track`.
    fn completed_on(&self, user: UserId, track: Track) -> Option<NaiveDate>;

    /// Mark `track` completed by `user` on `day`.
    fn mark_completed(&mut self, user: UserId, track: Track, day: NaiveDate);

    /// Remove completion marks dated strictly before `day`. Returns how many
    /// were removed.
    fn purge_completions_before(&mut self, day: NaiveDate) -> usize;

    /// Number of users whose `track` completion mark is `day`.
    fn completed_count(&self, track: Track, day: NaiveDate) -> usize;

    fn goals(&self, user: UserId) -> Option<&MonthlyGoals>;

    /// Replace the user's goals wholesale.
    fn set_goals(&mut self, user: UserId, goals: MonthlyGoals);

    /// Add `user` to the subscription set. Returns `false` if already present.
    fn subscribe(&mut self, user: UserId) -> bool;

    /// Remove `user` from the subscription set. Returns `false` if absent.
    fn unsubscribe(&mut self, user: UserId) -> bool;

    fn is_subscribed(&self, user: UserId) -> bool;

    /// Snapshot of subscribed users in ascending id order.
    fn subscribers(&self) -> Vec<UserId>;
}

/// In-memory [`StateStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: HashMap<(UserId, Track), TrackProgress>,
    completions: HashMap<(UserId, Track), NaiveDate>,
    goals: HashMap<UserId, MonthlyGoals>,
    subscribers: BTreeSet<UserId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn progress(&self, user: UserId, track: Track) -> Option<&TrackProgress> {
        self.progress.get(&(user, track))
    }

    fn progress_entry(&mut self, user: UserId, track: Track) -> &mut TrackProgress {
        self.progress.entry((user, track)).or_default()
    }

    fn upsert_progress(&mut self, user: UserId, track: Track, progress: TrackProgress) {
        self.progress.insert((user, track), progress);
    }

    fn remove_progress(&mut self, user: UserId, track: Track) -> Option<TrackProgress> {
        self.progress.remove(&(user, track))
    }

    fn progress_keys(&self) -> Vec<(UserId, Track)> {
        let mut keys: Vec<(UserId, Track)> = self.progress.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    fn completed_on(&self, user: UserId, track: Track) -> Option<NaiveDate> {
        self.completions.get(&(user, track)).copied()
    }

    fn mark_completed(&mut self, user: UserId, track: Track, day: NaiveDate) {
        self.completions.insert((user, track), day);
    }

    fn purge_completions_before(&mut self, day: NaiveDate) -> usize {
        let before = self.completions.len();
        self.completions.retain(|_, completed| *completed >= day);
        before - self.completions.len()
    }

    fn completed_count(&self, track: Track, day: NaiveDate) -> usize {
        self.completions
            .iter()
            .filter(|((_, t), completed)| *t == track && **completed == day)
            .count()
    }

    fn goals(&self, user: UserId) -> Option<&MonthlyGoals> {
        self.goals.get(&user)
    }

    fn set_goals(&mut self, user: UserId, goals: MonthlyGoals) {
        self.goals.insert(user, goals);
    }

    fn subscribe(&mut self, user: UserId) -> bool {
        self.subscribers.insert(user)
    }

    fn unsubscribe(&mut self, user: UserId) -> bool {
        self.subscribers.remove(&user)
    }

    fn is_subscribed(&self, user: UserId) -> bool {
        self.subscribers.contains(&user)
    }

    fn subscribers(&self) -> Vec<UserId> {
        self.subscribers.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn progress_entry_creates_lazily() {
        let mut store = MemoryStore::new();
        assert!(store.progress(1, Track::It).is_none());
        store.progress_entry(1, Track::It).remaining = 3;
        assert_eq!(store.progress(1, Track::It).unwrap().remaining, 3);
        assert!(store.progress(1, Track::Sport).is_none());
    }

    #[test]
    fn tracks_are_independent_keys() {
        let mut store = MemoryStore::new();
        store.progress_entry(1, Track::It).remaining = 1;
        store.upsert_progress(
            1,
            Track::Sport,
            TrackProgress {
                remaining: 2,
                ..TrackProgress::default()
            },
        );
        assert_eq!(store.progress(1, Track::Sport).unwrap().remaining, 2);
        assert_eq!(store.progress_keys(), vec![(1, Track::It), (1, Track::Sport)]);
        store.remove_progress(1, Track::It);
        assert_eq!(store.progress_keys(), vec![(1, Track::Sport)]);
    }

    #[test]
    fn purge_keeps_today_and_later() {
        let mut store = MemoryStore::new();
        store.mark_completed(1, Track::It, day(1));
        store.mark_completed(2, Track::It, day(2));
        store.mark_completed(2, Track::Sport, day(1));

        assert_eq!(store.purge_completions_before(day(2)), 2);
        assert_eq!(store.completed_on(2, Track::It), Some(day(2)));
        assert_eq!(store.completed_on(1, Track::It), None);
        assert_eq!(store.completed_count(Track::It, day(2)), 1);
        assert_eq!(store.completed_count(Track::Sport, day(2)), 0);
    }

    #[test]
    fn subscription_set_semantics() {
        let mut store = MemoryStore::new();
        assert!(store.subscribe(7));
        assert!(!store.subscribe(7));
        assert!(store.subscribe(3));
        assert_eq!(store.subscribers(), vec![3, 7]);
        assert!(store.unsubscribe(7));
        assert!(!store.unsubscribe(7));
        assert!(!store.is_subscribed(7));
    }
}
