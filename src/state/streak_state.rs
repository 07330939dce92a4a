//! Streak state structures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Streak value as reported by the remote counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl StreakRecord {
    pub fn new(current_streak: u32, last_completed_date: Option<NaiveDate>) -> Self {
        Self {
            current_streak,
            last_completed_date,
        }
    }

    /// Zero streak with no completion on record
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Streak badge thresholds shown alongside the counter
const MILESTONES: [(u32, &str); 4] = [
    (3, "3-Day Fire"),
    (7, "Week Streak"),
    (30, "Month Focus"),
    (100, "Centurion"),
];

/// A streak badge and whether it is currently achieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub days: u32,
    pub label: &'static str,
    pub achieved: bool,
}

/// Cached streak mirror with loading, stale and error markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakStatus {
    /// Last value read from or written to the remote counter
    pub record: StreakRecord,
    /// Whether an identity was available for the last operation
    pub authenticated: bool,
    /// A fetch is in flight
    pub loading: bool,
    /// The last remote operation failed, so `record` may be out of date
    pub stale: bool,
    /// Error from the last remote operation, if it failed
    pub error: Option<SyncError>,
}

impl StreakStatus {
    /// Resting state without an identity: zero streak, no error
    pub fn signed_out() -> Self {
        Self {
            record: StreakRecord::zero(),
            authenticated: false,
            loading: false,
            stale: false,
            error: None,
        }
    }

    /// State before the first fetch for an identity
    pub fn pending() -> Self {
        Self {
            record: StreakRecord::zero(),
            authenticated: true,
            loading: true,
            stale: true,
            error: None,
        }
    }

    pub fn current_streak(&self) -> u32 {
        self.record.current_streak
    }

    /// Milestone badges. None count as achieved while loading or in error.
    pub fn milestones(&self) -> Vec<Milestone> {
        let trusted = !self.loading && self.error.is_none();
        MILESTONES
            .iter()
            .map(|&(days, label)| Milestone {
                days,
                label,
                achieved: trusted && self.record.current_streak >= days,
            })
            .collect()
    }
}

impl Default for StreakStatus {
    fn default() -> Self {
        Self::signed_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_with(streak: u32) -> StreakStatus {
        StreakStatus {
            record: StreakRecord::new(streak, None),
            authenticated: true,
            loading: false,
            stale: false,
            error: None,
        }
    }

    #[test]
    fn signed_out_is_zero_without_error() {
        let status = StreakStatus::signed_out();
        assert_eq!(status.current_streak(), 0);
        assert!(status.error.is_none());
        assert!(!status.authenticated);
    }

    #[test]
    fn milestones_follow_streak() {
        let achieved: Vec<u32> = status_with(7)
            .milestones()
            .into_iter()
            .filter(|m| m.achieved)
            .map(|m| m.days)
            .collect();
        assert_eq!(achieved, vec![3, 7]);
    }

    #[test]
    fn milestones_are_withheld_on_error() {
        let mut status = status_with(120);
        status.error = Some(SyncError::RemoteRejected("HTTP 500".into()));
        assert!(status.milestones().iter().all(|m| !m.achieved));

        let mut status = status_with(120);
        status.loading = true;
        assert!(status.milestones().iter().all(|m| !m.achieved));
    }
}
