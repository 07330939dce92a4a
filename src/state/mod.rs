//! State management module
//!
//! This module contains all state-related structures and their management logic.

pub mod session_state;
pub mod streak_state;
pub mod app_state;

// Re-export main types
pub use session_state::{
    PhaseDurations, SessionPhase, SessionState, DEFAULT_BREAK_SECONDS, DEFAULT_WORK_SECONDS,
};
pub use streak_state::{Milestone, StreakRecord, StreakStatus};
pub use app_state::AppState;
