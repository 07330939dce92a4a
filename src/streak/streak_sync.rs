//! Cached streak value reconciled with the remote counter

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{CounterService, FetchOutcome, Identity};
use crate::{
    error::{RemoteError, SyncError},
    state::{StreakRecord, StreakStatus},
};

/// Current identity and how many times it has been swapped
#[derive(Debug, Default)]
struct IdentitySlot {
    identity: Option<Identity>,
    generation: u64,
}

/// Owner of the cached streak.
///
/// Every remote call passes through one gate, so responses are applied in
/// the order requests were issued. A response is only applied if the
/// identity that issued it is still the current one. Nothing here retries.
pub struct StreakSync {
    counter: Arc<dyn CounterService>,
    identity: RwLock<IdentitySlot>,
    status_tx: watch::Sender<StreakStatus>,
    request_gate: Mutex<()>,
}

impl std::fmt::Debug for StreakSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreakSync")
            .field("identity", &self.identity())
            .field("status", &self.status())
            .finish()
    }
}

impl StreakSync {
    pub fn new(counter: Arc<dyn CounterService>, identity: Option<Identity>) -> Self {
        let initial = if identity.is_some() {
            StreakStatus::pending()
        } else {
            StreakStatus::signed_out()
        };
        let (status_tx, _) = watch::channel(initial);

        Self {
            counter,
            identity: RwLock::new(IdentitySlot {
                identity,
                generation: 0,
            }),
            status_tx,
            request_gate: Mutex::new(()),
        }
    }

    pub fn status(&self) -> StreakStatus {
        self.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreakStatus> {
        self.status_tx.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.slot().identity.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot().identity.is_some()
    }

    /// Setup link for a missing counter resource
    pub fn setup_url(&self) -> Option<String> {
        self.counter.setup_url()
    }

    /// Swap the identity. Signing out returns to the zero resting state;
    /// signing in marks the cache stale until the next `load()`.
    ///
    /// Responses to requests issued under the previous identity are
    /// discarded when they arrive.
    pub fn set_identity(&self, identity: Option<Identity>) {
        let signed_in = identity.is_some();
        // Status is updated under the write lock so no in-flight response
        // can be applied between the swap and the reset.
        let mut slot = self.identity.write().unwrap_or_else(PoisonError::into_inner);
        slot.identity = identity;
        slot.generation += 1;

        if signed_in {
            info!("Identity set, streak cache is stale until reloaded");
            self.status_tx.send_modify(|status| {
                status.authenticated = true;
                status.stale = true;
                status.loading = false;
            });
        } else {
            info!("Identity cleared, streak reset to zero");
            self.status_tx.send_replace(StreakStatus::signed_out());
        }
    }

    /// Read the streak from the remote counter.
    ///
    /// Without an identity this settles on a zero streak with no error.
    /// A failed read keeps the last known value, marks it stale and records
    /// the error.
    pub async fn load(&self) -> StreakStatus {
        let _gate = self.request_gate.lock().await;
        let Some((identity, generation)) = self.current_identity() else {
            debug!("No identity, streak defaults to zero");
            self.status_tx.send_replace(StreakStatus::signed_out());
            return self.status();
        };

        self.apply_if_current(generation, |status| {
            status.authenticated = true;
            status.loading = true;
            status.error = None;
        });

        let result = self.counter.fetch_streak(&identity).await;
        self.apply_if_current(generation, |status| {
            status.loading = false;
            match result {
                Ok(FetchOutcome::Found(record)) => {
                    info!("Loaded streak: {}", record.current_streak);
                    status.record = record;
                    status.stale = false;
                }
                Ok(FetchOutcome::NotFound) => {
                    info!("No streak recorded yet, starting from zero");
                    status.record = StreakRecord::zero();
                    status.stale = false;
                }
                Err(e) => Self::apply_failure(status, "load", e),
            }
        });

        self.status()
    }

    /// Apply one completed work session to the remote counter.
    ///
    /// Issues exactly one increment request. On success the cache takes the
    /// returned value as is; on failure it is left untouched and the error
    /// is recorded.
    pub async fn record_completion(&self) -> StreakStatus {
        let _gate = self.request_gate.lock().await;
        let Some((identity, generation)) = self.current_identity() else {
            debug!("No identity, completion not recorded");
            return self.status();
        };

        self.apply_if_current(generation, |status| status.error = None);

        let result = self.counter.increment_streak(&identity).await;
        self.apply_if_current(generation, |status| match result {
            Ok(record) => {
                info!(
                    "Streak updated: {} -> {}",
                    status.record.current_streak, record.current_streak
                );
                status.authenticated = true;
                status.record = record;
                status.stale = false;
            }
            Err(e) => Self::apply_failure(status, "increment", e),
        });

        self.status()
    }

    fn slot(&self) -> RwLockReadGuard<'_, IdentitySlot> {
        self.identity.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_identity(&self) -> Option<(Identity, u64)> {
        let slot = self.slot();
        slot.identity.clone().map(|identity| (identity, slot.generation))
    }

    /// Update the status unless the identity changed since `generation`
    fn apply_if_current(&self, generation: u64, update: impl FnOnce(&mut StreakStatus)) {
        let slot = self.slot();
        if let Err(e) = Self::check_generation(&slot, generation) {
            debug!("Discarding streak response: {}", e);
            return;
        }
        self.status_tx.send_modify(update);
    }

    fn check_generation(slot: &IdentitySlot, generation: u64) -> Result<(), SyncError> {
        if slot.identity.is_none() || slot.generation != generation {
            return Err(SyncError::Unauthenticated);
        }
        Ok(())
    }

    fn apply_failure(status: &mut StreakStatus, operation: &str, error: RemoteError) {
        let error = SyncError::from(error);
        warn!("Streak {} failed: {}", operation, error);
        status.stale = true;
        status.error = Some(error);
    }
}
