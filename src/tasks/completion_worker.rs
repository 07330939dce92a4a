//! Completion worker background task
//!
//! Bridges the session clock's synchronous completion callback to the async
//! streak increment. The callback only enqueues; one worker drains the queue
//! and issues one increment per completion, in arrival order.

use std::{sync::Arc, time::Duration};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{clock::CompletionCallback, streak::StreakSync};

/// Spawn the worker and return the callback that feeds it.
///
/// Completions are never coalesced: two completions queued behind a slow
/// request still produce two increment requests.
pub fn spawn_completion_worker(sync: Arc<StreakSync>) -> (CompletionCallback, JoinHandle<()>) {
    let (completion_tx, completion_rx) = mpsc::unbounded_channel::<()>();

    let callback: CompletionCallback = Arc::new(move || {
        if completion_tx.send(()).is_err() {
            warn!("Completion worker stopped, work session not recorded");
        } else {
            debug!("Work session completion queued");
        }
    });

    let worker = tokio::spawn(completion_worker_task(sync, completion_rx));
    (callback, worker)
}

/// Wait for the worker to drain completions already queued.
///
/// Every clone of the callback must be dropped first, otherwise the queue
/// never closes and this waits out the full `within` window. Returns whether
/// the worker finished in time; on timeout the worker is aborted.
pub async fn drain_completion_worker(worker: JoinHandle<()>, within: Duration) -> bool {
    let abort = worker.abort_handle();
    match tokio::time::timeout(within, worker).await {
        Ok(Ok(())) => {
            info!("All queued completions recorded");
            true
        }
        Ok(Err(e)) => {
            warn!("Completion worker ended abnormally: {}", e);
            false
        }
        Err(_) => {
            warn!(
                "Completion worker still busy after {:?}, remaining completions dropped",
                within
            );
            abort.abort();
            false
        }
    }
}

async fn completion_worker_task(
    sync: Arc<StreakSync>,
    mut completion_rx: mpsc::UnboundedReceiver<()>,
) {
    info!("Starting completion worker task");

    while completion_rx.recv().await.is_some() {
        let status = sync.record_completion().await;
        match &status.error {
            Some(e) => debug!("Completion recorded with error state: {}", e),
            None => debug!("Completion recorded, streak={}", status.current_streak()),
        }
    }

    info!("Completion worker task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::RemoteError,
        state::StreakRecord,
        streak::{streak_sync::tests::ScriptedCounter, Identity},
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn each_completion_issues_one_increment_in_order() {
        let counter = Arc::new(
            ScriptedCounter::default()
                .with_increment(Ok(StreakRecord::new(4, None)))
                .with_increment(Err(RemoteError::Rejected("HTTP 500".into())))
                .with_increment(Ok(StreakRecord::new(5, None))),
        );
        let sync = Arc::new(StreakSync::new(counter.clone(), Identity::new("token")));
        let (callback, worker) = spawn_completion_worker(Arc::clone(&sync));

        let mut status_rx = sync.subscribe();
        callback();
        callback();
        callback();

        tokio::time::timeout(
            Duration::from_secs(5),
            status_rx.wait_for(|s| s.current_streak() == 5),
        )
        .await
        .expect("worker did not drain")
        .unwrap();

        assert_eq!(counter.increment_calls.load(Ordering::SeqCst), 3);
        assert!(sync.status().error.is_none());

        drop(callback);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn queued_completions_are_recorded_after_the_callback_drops() {
        let hold = Arc::new(tokio::sync::Notify::new());
        let counter = Arc::new(
            ScriptedCounter::default()
                .with_increment(Ok(StreakRecord::new(1, None)))
                .with_increment(Ok(StreakRecord::new(2, None)))
                .held_by(Arc::clone(&hold)),
        );
        let sync = Arc::new(StreakSync::new(counter.clone(), Identity::new("token")));
        let (callback, worker) = spawn_completion_worker(Arc::clone(&sync));

        callback();
        callback();
        drop(callback);

        let releasing = Arc::new(AtomicBool::new(true));
        let releaser = tokio::spawn({
            let releasing = Arc::clone(&releasing);
            async move {
                while releasing.load(Ordering::SeqCst) {
                    hold.notify_one();
                    tokio::task::yield_now().await;
                }
            }
        });

        assert!(drain_completion_worker(worker, Duration::from_secs(5)).await);
        releasing.store(false, Ordering::SeqCst);
        releaser.await.unwrap();
        assert_eq!(counter.increment_calls.load(Ordering::SeqCst), 2);
        assert_eq!(sync.status().current_streak(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_on_a_stuck_request() {
        let hold = Arc::new(tokio::sync::Notify::new());
        let counter = Arc::new(ScriptedCounter::default().held_by(Arc::clone(&hold)));
        let sync = Arc::new(StreakSync::new(counter.clone(), Identity::new("token")));
        let (callback, worker) = spawn_completion_worker(sync);

        callback();
        drop(callback);

        assert!(!drain_completion_worker(worker, Duration::from_secs(2)).await);
        assert_eq!(counter.increment_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn callback_after_worker_stops_does_not_panic() {
        let counter = Arc::new(ScriptedCounter::default());
        let sync = Arc::new(StreakSync::new(counter, None));
        let (callback, worker) = spawn_completion_worker(sync);

        worker.abort();
        let _ = worker.await;
        callback();
    }
}
