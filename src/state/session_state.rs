//! Session clock state structures

use serde::{Deserialize, Serialize};

/// Default length of a work phase (25 minutes)
pub const DEFAULT_WORK_SECONDS: u64 = 25 * 60;
/// Default length of a break phase (5 minutes)
pub const DEFAULT_BREAK_SECONDS: u64 = 5 * 60;

/// The active half of the focus cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionPhase {
    Work,
    Break,
}

impl SessionPhase {
    /// The phase that follows this one
    pub fn next(self) -> Self {
        match self {
            SessionPhase::Work => SessionPhase::Break,
            SessionPhase::Break => SessionPhase::Work,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Work => "WORK",
            SessionPhase::Break => "BREAK",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed phase lengths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub work_seconds: u64,
    pub break_seconds: u64,
}

impl PhaseDurations {
    /// Create phase durations. Zero lengths are raised to one second so a
    /// phase can always be counted down.
    pub fn new(work_seconds: u64, break_seconds: u64) -> Self {
        Self {
            work_seconds: work_seconds.max(1),
            break_seconds: break_seconds.max(1),
        }
    }

    /// Full countdown length of a phase
    pub fn for_phase(&self, phase: SessionPhase) -> u64 {
        match phase {
            SessionPhase::Work => self.work_seconds,
            SessionPhase::Break => self.break_seconds,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_SECONDS, DEFAULT_BREAK_SECONDS)
    }
}

/// Snapshot of the session clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub remaining_seconds: u64,
    pub running: bool,
}

impl SessionState {
    /// Initial state: a full, paused work phase
    pub fn initial(durations: &PhaseDurations) -> Self {
        Self {
            phase: SessionPhase::Work,
            remaining_seconds: durations.work_seconds,
            running: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_alternate() {
        assert_eq!(SessionPhase::Work.next(), SessionPhase::Break);
        assert_eq!(SessionPhase::Break.next(), SessionPhase::Work);
    }

    #[test]
    fn zero_durations_are_clamped() {
        let durations = PhaseDurations::new(0, 0);
        assert_eq!(durations.for_phase(SessionPhase::Work), 1);
        assert_eq!(durations.for_phase(SessionPhase::Break), 1);
    }

    #[test]
    fn initial_state_is_paused_full_work_phase() {
        let state = SessionState::initial(&PhaseDurations::default());
        assert_eq!(state.phase, SessionPhase::Work);
        assert_eq!(state.remaining_seconds, DEFAULT_WORK_SECONDS);
        assert!(!state.running);
    }

    #[test]
    fn phase_serializes_uppercase() {
        let json = serde_json::to_string(&SessionPhase::Break).unwrap();
        assert_eq!(json, "\"BREAK\"");
    }
}
