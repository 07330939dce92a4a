//! Pure WORK/BREAK state machine
//!
//! The machine has no timers and no I/O. Every call is a synchronous step;
//! the caller decides when `tick()` happens.
//!
//! ```text
//! WORK --(remaining hits 0, emits completion)--> BREAK
//! BREAK --(remaining hits 0)--> WORK
//! ```

use crate::{
    error::ClockError,
    state::{PhaseDurations, SessionPhase, SessionState},
};

/// Result of a successful tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed within the current phase
    Counted { remaining_seconds: u64 },
    /// The countdown reached zero and the next phase started
    Transitioned { from: SessionPhase, to: SessionPhase },
}

impl TickOutcome {
    /// True when the tick ended a work phase
    pub fn work_completed(&self) -> bool {
        matches!(
            self,
            TickOutcome::Transitioned {
                from: SessionPhase::Work,
                ..
            }
        )
    }
}

#[derive(Debug, Clone)]
pub struct PhaseMachine {
    durations: PhaseDurations,
    state: SessionState,
}

impl PhaseMachine {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            state: SessionState::initial(&durations),
            durations,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    /// Full length of the current phase
    pub fn total_seconds(&self) -> u64 {
        self.durations.for_phase(self.state.phase)
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Returns true if the machine was paused before the call
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        self.state.running = true;
        true
    }

    /// Returns true if the machine was running before the call
    pub fn pause(&mut self) -> bool {
        if !self.state.running {
            return false;
        }
        self.state.running = false;
        true
    }

    /// Flip between running and paused, returning the new running flag
    pub fn toggle(&mut self) -> bool {
        if self.state.running {
            self.pause();
        } else {
            self.start();
        }
        self.state.running
    }

    /// Stop and refill the current phase. The phase itself is kept.
    pub fn reset(&mut self) {
        self.state.running = false;
        self.state.remaining_seconds = self.total_seconds();
    }

    /// Advance the countdown by one logical second.
    ///
    /// Reaching zero switches phase within the same tick and leaves the
    /// machine running. A tick while paused is rejected without touching
    /// state.
    pub fn tick(&mut self) -> Result<TickOutcome, ClockError> {
        if !self.state.running {
            return Err(ClockError::SchedulerMisuse);
        }

        let remaining = self.state.remaining_seconds.saturating_sub(1);
        if remaining > 0 {
            self.state.remaining_seconds = remaining;
            return Ok(TickOutcome::Counted {
                remaining_seconds: remaining,
            });
        }

        let from = self.state.phase;
        let to = from.next();
        self.state.phase = to;
        self.state.remaining_seconds = self.durations.for_phase(to);
        Ok(TickOutcome::Transitioned { from, to })
    }
}
