//! Timekeeper: the worker driving deadline-based transitions.
//!
//! One long-lived task per queue. Each pass probes exactly four index heads
//! (earliest Delayed, earliest ttl-bearing Ready/Blocked/Buried, earliest
//! Taken), applies whatever is due, and sleeps until the tightest remaining
//! deadline or an external wake. Anything due forces an immediate re-scan,
//! so batches drain one head entry at a time without accumulating slack.

use std::sync::Arc;

use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::domain::{TaskEvent, TaskRecord, TaskStatus};
use crate::ports::{Clock, TaskChangeSink};
use crate::queue::{limits, QueueState};

/// Cap on one timer sleep. A longer estimate just re-scans here first;
/// spurious wakeups are harmless, and timer backends dislike multi-year
/// deadlines.
const MAX_SLEEP: Duration = Duration::from_secs(3600);

/// One scan pass: the changes applied and the tightest deadline among tasks
/// not yet due. `Some(0)` means something was due, so scan again before
/// sleeping; `None` means the store holds nothing to wait for.
pub(crate) struct ScanOutcome {
    pub(crate) events: Vec<(TaskRecord, Option<TaskEvent>)>,
    pub(crate) next_due_in: Option<u64>,
}

pub(crate) fn scan(state: &mut QueueState, now: u64) -> ScanOutcome {
    let mut events = Vec::new();
    let mut estimated = u64::MAX;
    let mut due = false;

    // Delayed head: the delay elapsed, the task re-enters its tube.
    if let Some((id, deadline)) = state.store.min_deadline(TaskStatus::Delayed) {
        if deadline <= now {
            if let Some(tube) = state.store.get(id).map(|rec| rec.tube.clone()) {
                let status = limits::admit(&state.store, &state.limits, &tube);
                if let Some(task) = state.store.update(id, |rec| rec.promote(status)) {
                    events.push((task, None));
                }
            }
            due = true;
        } else {
            estimated = estimated.min(deadline - now);
        }
    }

    // Ttl heads: an expired task leaves the store as Done.
    for status in [TaskStatus::Ready, TaskStatus::Blocked, TaskStatus::Buried] {
        if let Some((id, deadline)) = state.store.min_deadline(status) {
            if deadline <= now {
                if let Some(mut task) = state.store.remove(id) {
                    let prior = task.status;
                    let tube = task.tube.clone();
                    task.status = TaskStatus::Done;
                    events.push((task, None));
                    // An expired Ready task frees an in-flight slot; hand it
                    // to the oldest Blocked peer right away instead of
                    // leaving the tube under-used.
                    if prior.is_in_flight() {
                        if let Some(promoted) = limits::unblock_one(&mut state.store, &tube) {
                            events.push((promoted, None));
                        }
                    }
                }
                due = true;
            } else {
                estimated = estimated.min(deadline - now);
            }
        }
    }

    // Ttr head: the consumer ran out of time, back to the ready line.
    if let Some((id, deadline)) = state.store.min_deadline(TaskStatus::Taken) {
        if deadline <= now {
            if let Some(task) = state.store.update(id, |rec| rec.requeue()) {
                events.push((task, None));
            }
            due = true;
        } else {
            estimated = estimated.min(deadline - now);
        }
    }

    let next_due_in = if due {
        Some(0)
    } else if estimated == u64::MAX {
        None
    } else {
        Some(estimated)
    };

    ScanOutcome { events, next_due_in }
}

/// Handle to the queue's timekeeper worker.
///
/// The queue owns exactly one; dropping the queue closes the shutdown
/// channel and the worker exits on its next wakeup.
pub(crate) struct Timekeeper {
    shutdown_tx: watch::Sender<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Timekeeper {
    pub(crate) fn spawn(
        state: Arc<Mutex<QueueState>>,
        notify: Arc<Notify>,
        sink: Arc<dyn TaskChangeSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                let outcome = {
                    let mut st = state.lock().await;
                    scan(&mut st, clock.now_micros())
                };

                // User callbacks run outside the queue lock.
                for (task, event) in &outcome.events {
                    sink.on_task_change(task, *event);
                }

                match outcome.next_due_in {
                    // Something was due: drain before sleeping.
                    Some(0) => continue,
                    Some(us) => {
                        let dur = Duration::from_micros(us).min(MAX_SLEEP);
                        tokio::select! {
                            _ = notify.notified() => {}
                            _ = shutdown_rx.changed() => {}
                            _ = sleep(dur) => {}
                        }
                    }
                    None => {
                        tokio::select! {
                            _ = notify.notified() => {}
                            _ = shutdown_rx.changed() => {}
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// Request shutdown and wait for the worker to exit. Idempotent.
    pub(crate) async fn shutdown_and_join(&self) {
        // ignore send error: the worker may already be gone
        let _ = self.shutdown_tx.send(true);
        if let Some(join) = self.join.lock().await.take() {
            let _ = join.await;
        }
    }
}
