//! Streak synchronization module
//!
//! This module keeps the cached daily streak in step with the remote counter
//! service that owns it.

pub mod counter;
pub mod identity;
pub mod rest;
pub mod streak_sync;

// Re-export main types
pub use counter::{CounterService, FetchOutcome};
pub use identity::Identity;
pub use rest::RestCounterService;
pub use streak_sync::StreakSync;
