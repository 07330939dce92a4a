//! Focus Streak - A state-managed HTTP server for a work/break focus timer
//!
//! This library provides a repeating WORK/BREAK session clock and a daily
//! streak counter kept in sync with a remote counter service. Each completed
//! work phase becomes at most one remote increment.

pub mod config;
pub mod error;
pub mod state;
pub mod clock;
pub mod streak;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{ClockError, RemoteError, SyncError};
pub use state::AppState;
pub use clock::SessionClock;
pub use streak::StreakSync;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
