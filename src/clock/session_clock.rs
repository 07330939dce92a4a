//! Scheduled session clock
//!
//! Wraps the [`PhaseMachine`] with a periodic trigger and a completion
//! callback. The trigger is held only while the clock runs: `start()`
//! acquires it, and `pause()`, `reset()`, `shutdown()` and dropping the last
//! handle release it.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::{
    machine::{PhaseMachine, TickOutcome},
    scheduler::{ScheduleHandle, Scheduler, TickCallback},
};
use crate::{
    error::ClockError,
    state::{PhaseDurations, SessionState},
};

/// Zero-argument callback fired once per completed work phase
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Interval between clock ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

struct ClockShared {
    machine: Mutex<PhaseMachine>,
    trigger: Mutex<Option<ScheduleHandle>>,
    scheduler: Arc<dyn Scheduler>,
    on_complete: Mutex<Option<CompletionCallback>>,
    state_tx: watch::Sender<SessionState>,
    tick_interval: Duration,
}

impl ClockShared {
    fn machine(&self) -> MutexGuard<'_, PhaseMachine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn trigger(&self) -> MutexGuard<'_, Option<ScheduleHandle>> {
        self.trigger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn completion_callback(&self) -> Option<CompletionCallback> {
        self.on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn release_trigger(&self) {
        if let Some(handle) = self.trigger().take() {
            self.scheduler.cancel(handle);
            debug!("Released clock trigger {}", handle.id());
        }
    }
}

impl Drop for ClockShared {
    fn drop(&mut self) {
        self.release_trigger();
    }
}

/// Handle to the WORK/BREAK countdown. Clones share the same clock.
#[derive(Clone)]
pub struct SessionClock {
    shared: Arc<ClockShared>,
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("state", &self.state())
            .field("trigger", &*self.shared.trigger())
            .finish()
    }
}

impl SessionClock {
    pub fn new(
        durations: PhaseDurations,
        scheduler: Arc<dyn Scheduler>,
        on_complete: CompletionCallback,
    ) -> Self {
        Self::with_tick_interval(durations, scheduler, on_complete, TICK_INTERVAL)
    }

    pub fn with_tick_interval(
        durations: PhaseDurations,
        scheduler: Arc<dyn Scheduler>,
        on_complete: CompletionCallback,
        tick_interval: Duration,
    ) -> Self {
        let machine = PhaseMachine::new(durations);
        let (state_tx, _) = watch::channel(machine.snapshot());

        Self {
            shared: Arc::new(ClockShared {
                machine: Mutex::new(machine),
                trigger: Mutex::new(None),
                scheduler,
                on_complete: Mutex::new(Some(on_complete)),
                state_tx,
                tick_interval,
            }),
        }
    }

    /// Current clock snapshot
    pub fn state(&self) -> SessionState {
        self.shared.machine().snapshot()
    }

    /// Watch snapshots as they change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    pub fn durations(&self) -> PhaseDurations {
        self.shared.machine().durations()
    }

    /// Whether a periodic trigger is currently held
    pub fn has_trigger(&self) -> bool {
        self.shared.trigger().is_some()
    }

    pub fn start(&self) -> SessionState {
        let mut machine = self.shared.machine();
        if machine.start() {
            self.acquire_trigger();
            info!(
                "Session clock started: phase={}, remaining={}s",
                machine.snapshot().phase,
                machine.snapshot().remaining_seconds
            );
        } else {
            debug!("Start ignored, clock already running");
        }
        self.publish(&machine)
    }

    pub fn pause(&self) -> SessionState {
        let mut machine = self.shared.machine();
        if machine.pause() {
            info!(
                "Session clock paused: phase={}, remaining={}s",
                machine.snapshot().phase,
                machine.snapshot().remaining_seconds
            );
        } else {
            debug!("Pause ignored, clock already paused");
        }
        self.shared.release_trigger();
        self.publish(&machine)
    }

    pub fn toggle(&self) -> SessionState {
        // Checked and applied under one lock so a concurrent call cannot interleave
        let mut machine = self.shared.machine();
        if machine.toggle() {
            self.acquire_trigger();
            info!("Session clock resumed via toggle");
        } else {
            self.shared.release_trigger();
            info!("Session clock paused via toggle");
        }
        self.publish(&machine)
    }

    /// Stop the clock and refill the current phase. Progress toward a
    /// pending completion is discarded.
    pub fn reset(&self) -> SessionState {
        let mut machine = self.shared.machine();
        machine.reset();
        self.shared.release_trigger();
        info!(
            "Session clock reset: phase={}, remaining={}s",
            machine.snapshot().phase,
            machine.snapshot().remaining_seconds
        );
        self.publish(&machine)
    }

    /// Advance the clock one second.
    ///
    /// Returns [`ClockError::SchedulerMisuse`] if the clock is paused. When a
    /// work phase ends the completion callback runs after the clock state is
    /// updated; it is not awaited and cannot affect the countdown.
    pub fn tick(&self) -> Result<SessionState, ClockError> {
        self.step().inspect_err(|e| {
            error!("Session clock misuse: {}", e);
        })
    }

    /// Explicit teardown: pause, release the trigger and drop the completion
    /// callback. The clock still answers snapshots afterwards but no longer
    /// reports completions.
    pub fn shutdown(&self) {
        let mut machine = self.shared.machine();
        machine.pause();
        self.shared.release_trigger();
        self.shared
            .on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.publish(&machine);
        info!("Session clock shut down");
    }

    fn step(&self) -> Result<SessionState, ClockError> {
        let (outcome, snapshot) = {
            let mut machine = self.shared.machine();
            let outcome = machine.tick()?;
            (outcome, self.publish(&machine))
        };

        if let TickOutcome::Transitioned { from, to } = outcome {
            info!(
                "Phase {} finished, {} started ({}s)",
                from, to, snapshot.remaining_seconds
            );
        }

        if outcome.work_completed() {
            match self.shared.completion_callback() {
                Some(on_complete) => on_complete(),
                None => debug!("Work phase completed after shutdown, not reported"),
            }
        }

        Ok(snapshot)
    }

    // Caller holds the machine lock, which keeps trigger changes ordered
    fn acquire_trigger(&self) {
        let mut trigger = self.shared.trigger();
        if trigger.is_some() {
            return;
        }

        let weak: Weak<ClockShared> = Arc::downgrade(&self.shared);
        let callback: TickCallback = Arc::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let clock = SessionClock { shared };
            if let Err(e) = clock.step() {
                // A trigger that raced a pause
                debug!("Dropping stale clock tick: {}", e);
            }
        });

        let handle = self
            .shared
            .scheduler
            .schedule(callback, self.shared.tick_interval);
        debug!("Acquired clock trigger {}", handle.id());
        *trigger = Some(handle);
    }

    fn publish(&self, machine: &PhaseMachine) -> SessionState {
        let snapshot = machine.snapshot();
        self.shared.state_tx.send_replace(snapshot);
        snapshot
    }
}
