//! Session clock module
//!
//! The WORK/BREAK countdown: a pure state machine, the scheduled clock that
//! drives it, and the periodic trigger primitives.

pub mod machine;
pub mod scheduler;
pub mod session_clock;

// Re-export main types
pub use machine::{PhaseMachine, TickOutcome};
pub use scheduler::{ManualScheduler, ScheduleHandle, Scheduler, TickCallback, TokioScheduler};
pub use session_clock::{CompletionCallback, SessionClock, TICK_INTERVAL};
