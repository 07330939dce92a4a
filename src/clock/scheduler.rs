//! Periodic trigger primitives used to drive the session clock

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

/// Callback fired on every trigger interval
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// Identifies one scheduled periodic trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

impl ScheduleHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Fires a callback at a fixed interval until cancelled
pub trait Scheduler: Send + Sync {
    fn schedule(&self, callback: TickCallback, interval: Duration) -> ScheduleHandle;

    /// Stop a trigger. Unknown or already cancelled handles are ignored.
    fn cancel(&self, handle: ScheduleHandle);
}

/// Scheduler backed by tokio interval tasks
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Scheduler on the runtime of the calling task
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Number of triggers currently scheduled
    pub fn active_count(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, callback: TickCallback, period: Duration) -> ScheduleHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let task = self.runtime.spawn(async move {
            // First tick one full period after scheduling, not immediately
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });

        debug!("Scheduled periodic trigger {} every {:?}", id, period);
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        ScheduleHandle(id)
    }

    fn cancel(&self, handle: ScheduleHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
        if let Some(task) = task {
            task.abort();
            debug!("Cancelled periodic trigger {}", handle.0);
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}

/// Scheduler that only fires when told to
///
/// Callbacks run on the thread calling [`ManualScheduler::fire`], outside the
/// scheduler's own lock, so a callback may schedule or cancel triggers.
#[derive(Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    triggers: Mutex<HashMap<u64, (TickCallback, Duration)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every live trigger once. Returns how many fired.
    pub fn fire(&self) -> usize {
        let mut callbacks: Vec<(u64, TickCallback)> = self
            .triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, (callback, _))| (*id, Arc::clone(callback)))
            .collect();
        callbacks.sort_by_key(|(id, _)| *id);

        for (_, callback) in &callbacks {
            callback();
        }
        callbacks.len()
    }

    /// Fire `times` rounds in a row
    pub fn fire_times(&self, times: usize) {
        for _ in 0..times {
            self.fire();
        }
    }

    pub fn active_count(&self) -> usize {
        self.triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Intervals of the live triggers, in scheduling order
    pub fn intervals(&self) -> Vec<Duration> {
        let triggers = self.triggers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = triggers.iter().map(|(id, (_, every))| (*id, *every)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, every)| every).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, callback: TickCallback, interval: Duration) -> ScheduleHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, (callback, interval));
        ScheduleHandle(id)
    }

    fn cancel(&self, handle: ScheduleHandle) {
        self.triggers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);
    }
}
