//! Quest progress state machine.
//!
//! Three states: `not_started` -> `in_progress` -> `completed`. Completed
//! is terminal; only deleting the row (an administrative action outside
//! this component) resets a quest.

use crate::types::{ProgressStatus, QuestProgress};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl QuestProgress {
    /// Fresh progress row in the initial state
    pub fn new(quest_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            quest_id,
            status: ProgressStatus::NotStarted,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Mark the quest as opened.
    ///
    /// Moves `not_started` to `in_progress` and stamps `started_at` if
    /// unset. Idempotent: opening an in-progress or completed quest is a
    /// no-op.
    pub fn open(&mut self, now: DateTime<Utc>) {
        if self.status != ProgressStatus::NotStarted {
            return;
        }
        self.status = ProgressStatus::InProgress;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.updated_at = now;
        tracing::debug!("Quest {} opened", self.quest_id);
    }

    /// Mark the quest as completed.
    ///
    /// Always transitions to `completed` regardless of the prior state,
    /// back-filling `started_at` when the quest was never opened. Repeated
    /// calls simply refresh `completed_at`.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = ProgressStatus::Completed;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.completed_at = Some(now);
        self.updated_at = now;
        tracing::debug!("Quest {} completed", self.quest_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_progress_is_not_started() {
        let progress = QuestProgress::new(Uuid::new_v4(), Utc::now());
        assert_eq!(progress.status, ProgressStatus::NotStarted);
        assert!(progress.started_at.is_none());
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn test_open_moves_to_in_progress() {
        let now = Utc::now();
        let mut progress = QuestProgress::new(Uuid::new_v4(), now);

        progress.open(now);
        assert_eq!(progress.status, ProgressStatus::InProgress);
        assert_eq!(progress.started_at, Some(now));
    }

    #[test]
    fn test_second_open_is_a_noop() {
        let first = Utc::now();
        let mut progress = QuestProgress::new(Uuid::new_v4(), first);
        progress.open(first);

        let later = first + chrono::Duration::minutes(5);
        progress.open(later);

        assert_eq!(progress.status, ProgressStatus::InProgress);
        assert_eq!(progress.started_at, Some(first));
        assert_eq!(progress.updated_at, first);
    }

    #[test]
    fn test_open_after_complete_is_a_noop() {
        let now = Utc::now();
        let mut progress = QuestProgress::new(Uuid::new_v4(), now);
        progress.complete(now);

        progress.open(now + chrono::Duration::minutes(1));
        assert_eq!(progress.status, ProgressStatus::Completed);
    }

    #[test]
    fn test_complete_from_not_started_backfills_started_at() {
        let now = Utc::now();
        let mut progress = QuestProgress::new(Uuid::new_v4(), now);

        progress.complete(now);
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.started_at, Some(now));
        assert_eq!(progress.completed_at, Some(now));
    }

    #[test]
    fn test_repeat_complete_refreshes_completed_at() {
        let first = Utc::now();
        let mut progress = QuestProgress::new(Uuid::new_v4(), first);
        progress.open(first);
        progress.complete(first);

        let later = first + chrono::Duration::hours(1);
        progress.complete(later);

        assert_eq!(progress.completed_at, Some(later));
        assert_eq!(progress.started_at, Some(first));
    }
}
