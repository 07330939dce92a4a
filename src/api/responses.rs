//! API response structures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::SyncError,
    state::{Milestone, SessionPhase, SessionState, StreakStatus},
};

/// Timer snapshot returned by every `/timer` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerResponse {
    pub phase: SessionPhase,
    pub remaining_seconds: u64,
    pub running: bool,
    pub total_seconds: u64,
    /// Remaining time as `MM:SS`
    pub display: String,
    /// Fraction of the current phase already elapsed
    pub progress: f64,
    pub timestamp: DateTime<Utc>,
}

impl TimerResponse {
    pub fn new(state: SessionState, total_seconds: u64) -> Self {
        let progress = if total_seconds > 0 {
            (total_seconds.saturating_sub(state.remaining_seconds)) as f64 / total_seconds as f64
        } else {
            0.0
        };

        Self {
            phase: state.phase,
            remaining_seconds: state.remaining_seconds,
            running: state.running,
            total_seconds,
            display: format_clock(state.remaining_seconds),
            progress,
            timestamp: Utc::now(),
        }
    }
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Guidance for errors that need manual setup
#[derive(Debug, Clone, Serialize)]
pub struct Remediation {
    pub message: &'static str,
    pub setup_url: Option<String>,
}

/// Streak status with milestones and remediation guidance
#[derive(Debug, Clone, Serialize)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    pub authenticated: bool,
    pub loading: bool,
    pub stale: bool,
    pub error: Option<SyncError>,
    pub remediation: Option<Remediation>,
    pub milestones: Vec<Milestone>,
}

impl StreakResponse {
    pub fn new(status: StreakStatus, setup_url: Option<String>) -> Self {
        let remediation = status
            .error
            .as_ref()
            .and_then(SyncError::remediation)
            .map(|message| Remediation { message, setup_url });

        Self {
            current_streak: status.record.current_streak,
            last_completed_date: status.record.last_completed_date,
            authenticated: status.authenticated,
            loading: status.loading,
            stale: status.stale,
            milestones: status.milestones(),
            error: status.error,
            remediation,
        }
    }
}

/// Combined status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerResponse,
    pub streak: StreakResponse,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StreakRecord;

    #[test]
    fn clock_display_pads_minutes_and_seconds() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn progress_is_elapsed_fraction() {
        let state = SessionState {
            phase: SessionPhase::Work,
            remaining_seconds: 75,
            running: true,
        };
        let response = TimerResponse::new(state, 100);
        assert!((response.progress - 0.25).abs() < f64::EPSILON);
        assert_eq!(response.display, "01:15");
    }

    #[test]
    fn unavailable_error_carries_remediation() {
        let status = StreakStatus {
            record: StreakRecord::new(2, None),
            authenticated: true,
            loading: false,
            stale: true,
            error: Some(SyncError::RemoteUnavailable("no table".into())),
        };
        let response = StreakResponse::new(status, Some("https://setup".into()));
        let remediation = response.remediation.expect("remediation");
        assert_eq!(remediation.setup_url.as_deref(), Some("https://setup"));
        assert!(response.milestones.iter().all(|m| !m.achieved));
    }

    #[test]
    fn rejected_error_has_no_remediation() {
        let status = StreakStatus {
            record: StreakRecord::new(2, None),
            authenticated: true,
            loading: false,
            stale: true,
            error: Some(SyncError::RemoteRejected("HTTP 500".into())),
        };
        assert!(StreakResponse::new(status, None).remediation.is_none());
    }
}
