//! Queue module: the queue port, per-tube limits, the indexed store, and the
//! in-memory implementation.

pub(crate) mod limits;
mod options;
pub(crate) mod store;

pub use options::{PutOptions, ReleaseOptions};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::domain::{TaskEvent, TaskId, TaskRecord, TaskStatus, TaskView};
use crate::error::SpoolError;
use crate::observability::QueueCounts;
use crate::ports::{Clock, NoopSink, SystemClock, TaskChangeSink};
use crate::timekeeper::Timekeeper;

use self::options::{micros, QueueDefaults, TIMEOUT_INFINITY_US};
use self::store::IndexedStore;

/// Queue port (interface).
///
/// The in-memory implementation is `SpoolQueue`; the trait is the seam for
/// swapping implementations later.
///
/// `take` does not block: a consumer that finds nothing decides for itself
/// whether to poll, back off, or give up. Unknown ids are misses (`None`),
/// not errors.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Insert a new task. It enters Delayed when a delay is given, otherwise
    /// Ready or Blocked depending on its tube's free slots.
    async fn put(&self, data: serde_json::Value, opts: PutOptions) -> TaskRecord;

    /// Claim the best Ready task (lowest pri, then lowest id) and start its
    /// ttr countdown.
    async fn take(&self) -> Option<TaskRecord>;

    /// Give a taken task back: to the tube's waiting line, or into a delay.
    async fn release(&self, id: TaskId, opts: ReleaseOptions) -> Option<TaskRecord>;

    /// Remove a task for good. The returned snapshot carries status Done.
    async fn delete(&self, id: TaskId) -> Option<TaskRecord>;

    /// Park a task until someone kicks it.
    async fn bury(&self, id: TaskId) -> Option<TaskRecord>;

    /// Revive up to `n` buried tasks (smallest pri first); returns how many
    /// were revived.
    async fn kick(&self, n: usize) -> usize;

    /// Look a task up without touching it.
    async fn peek(&self, id: TaskId) -> Option<TaskRecord>;

    /// Extend a task's next_event, ttl, and ttr by `delta`.
    async fn touch(&self, id: TaskId, delta: Duration) -> Option<TaskRecord>;
}

pub(crate) struct QueueState {
    pub(crate) store: IndexedStore,
    pub(crate) limits: HashMap<String, usize>,
}

/// In-memory tube queue.
///
/// All operations and the timekeeper's scans serialize on one async mutex;
/// no operation awaits between its admission check and the write that
/// depends on it, so the per-tube limit invariant holds without extra
/// locking. State changes wake the timekeeper before user callbacks run.
pub struct SpoolQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    sink: Arc<dyn TaskChangeSink>,
    clock: Arc<dyn Clock>,
    defaults: QueueDefaults,
    timekeeper: Timekeeper,
}

impl SpoolQueue {
    pub fn builder() -> SpoolQueueBuilder {
        SpoolQueueBuilder::default()
    }

    /// The public projection of a task: id, status, payload.
    pub fn normalize_task(task: &TaskRecord) -> TaskView {
        task.view()
    }

    pub async fn counts_by_status(&self) -> QueueCounts {
        self.state.lock().await.store.counts()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.store.is_empty()
    }

    /// Stop the timekeeper worker and wait for it to exit. Idempotent.
    pub async fn shutdown(&self) {
        self.timekeeper.shutdown_and_join().await;
    }

    /// Deliver change notifications for a finished operation: wake the
    /// timekeeper first (the change may have shortened its scan horizon),
    /// then run user code, outside the queue lock.
    fn emit(&self, events: Vec<(TaskRecord, Option<TaskEvent>)>) {
        if events.is_empty() {
            return;
        }
        self.notify.notify_one();
        for (task, event) in &events {
            self.sink.on_task_change(task, *event);
        }
    }
}

#[async_trait]
impl TaskQueue for SpoolQueue {
    async fn put(&self, data: serde_json::Value, opts: PutOptions) -> TaskRecord {
        let now = self.clock.now_micros();
        let ttl = opts.ttl.map(micros).unwrap_or(self.defaults.ttl);
        let ttr = opts.ttr.map(micros).unwrap_or(self.defaults.ttr);
        let pri = opts.pri.unwrap_or(self.defaults.pri);
        let tube = opts.tube.unwrap_or_default();
        let delay = opts.delay.map(micros).unwrap_or(0);

        let task = {
            let mut st = self.state.lock().await;
            let id = st.store.next_id();
            // A delayed task lives its delay on top of its ttl.
            let (status, ttl, next_event) = if delay > 0 {
                (
                    TaskStatus::Delayed,
                    ttl.saturating_add(delay),
                    now.saturating_add(delay),
                )
            } else {
                (
                    limits::admit(&st.store, &st.limits, &tube),
                    ttl,
                    now.saturating_add(ttl),
                )
            };
            let task = TaskRecord {
                id,
                status,
                next_event,
                ttl,
                ttr,
                pri,
                created: now,
                tube,
                data,
            };
            st.store.insert(task.clone());
            task
        };

        self.emit(vec![(task.clone(), Some(TaskEvent::Put))]);
        task
    }

    async fn take(&self) -> Option<TaskRecord> {
        let now = self.clock.now_micros();
        let task = {
            let mut st = self.state.lock().await;
            let id = st.store.min_by_pri(TaskStatus::Ready)?;
            // Ready -> Taken leaves the tube's in-flight sum unchanged, so
            // no admission check here.
            st.store.update(id, |rec| rec.start_run(now))?
        };

        self.emit(vec![(task.clone(), Some(TaskEvent::Take))]);
        Some(task)
    }

    async fn release(&self, id: TaskId, opts: ReleaseOptions) -> Option<TaskRecord> {
        let now = self.clock.now_micros();
        let delay = opts.delay.map(micros).unwrap_or(0);

        let (task, events) = {
            let mut st = self.state.lock().await;
            let prior = st.store.get(id)?.status;
            // Even with a free slot the task is parked as Blocked; the
            // promotion below hands the slot to the oldest Blocked task in
            // the tube, which may be this one. Age order wins over the
            // releaser.
            let task = if delay > 0 {
                st.store.update(id, |rec| rec.delay_until(now, delay))?
            } else {
                st.store.update(id, |rec| rec.park())?
            };
            let mut events = vec![(task.clone(), Some(TaskEvent::Release))];
            if prior.is_in_flight() {
                if let Some(promoted) = limits::unblock_one(&mut st.store, &task.tube) {
                    events.push((promoted, None));
                }
            }
            (task, events)
        };

        self.emit(events);
        Some(task)
    }

    async fn delete(&self, id: TaskId) -> Option<TaskRecord> {
        let (task, events) = {
            let mut st = self.state.lock().await;
            let mut task = st.store.remove(id)?;
            let prior = task.status;
            task.status = TaskStatus::Done;
            let mut events = vec![(task.clone(), Some(TaskEvent::Delete))];
            if prior.is_in_flight() {
                if let Some(promoted) = limits::unblock_one(&mut st.store, &task.tube) {
                    events.push((promoted, None));
                }
            }
            (task, events)
        };

        self.emit(events);
        Some(task)
    }

    async fn bury(&self, id: TaskId) -> Option<TaskRecord> {
        let (task, events) = {
            let mut st = self.state.lock().await;
            let prior = st.store.get(id)?.status;
            let task = st.store.update(id, |rec| rec.bury())?;
            let mut events = vec![(task.clone(), Some(TaskEvent::Bury))];
            if prior.is_in_flight() {
                if let Some(promoted) = limits::unblock_one(&mut st.store, &task.tube) {
                    events.push((promoted, None));
                }
            }
            (task, events)
        };

        self.emit(events);
        Some(task)
    }

    async fn kick(&self, n: usize) -> usize {
        let events = {
            let mut st = self.state.lock().await;
            let mut events = Vec::new();
            for _ in 0..n {
                let Some(id) = st.store.min_by_pri(TaskStatus::Buried) else {
                    break;
                };
                let Some(tube) = st.store.get(id).map(|rec| rec.tube.clone()) else {
                    break;
                };
                let status = limits::admit(&st.store, &st.limits, &tube);
                if let Some(task) = st.store.update(id, |rec| rec.kick_to(status)) {
                    events.push((task, Some(TaskEvent::Kick)));
                }
            }
            events
        };

        let kicked = events.len();
        self.emit(events);
        kicked
    }

    async fn peek(&self, id: TaskId) -> Option<TaskRecord> {
        self.state.lock().await.store.get(id).cloned()
    }

    async fn touch(&self, id: TaskId, delta: Duration) -> Option<TaskRecord> {
        let delta = micros(delta);
        let task = {
            let mut st = self.state.lock().await;
            st.store.update(id, |rec| rec.extend(delta))?
        };

        self.emit(vec![(task.clone(), Some(TaskEvent::Touch))]);
        Some(task)
    }
}

/// Builder for `SpoolQueue`.
///
/// Fail-fast: `build()` validates every configured tube limit and refuses to
/// start on a bad one, then spawns the timekeeper.
#[derive(Default)]
pub struct SpoolQueueBuilder {
    ttl: Option<Duration>,
    ttr: Option<Duration>,
    pri: Option<i64>,
    limits: HashMap<String, usize>,
    sink: Option<Arc<dyn TaskChangeSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SpoolQueueBuilder {
    /// Default ttl for new tasks. Unset means "practically never expires"
    /// (500 years).
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Default ttr for new tasks. Unset means the ttl default.
    pub fn ttr(mut self, ttr: Duration) -> Self {
        self.ttr = Some(ttr);
        self
    }

    /// Default priority for new tasks (lower value runs first).
    pub fn pri(mut self, pri: i64) -> Self {
        self.pri = Some(pri);
        self
    }

    /// In-flight (Ready + Taken) cap for one tube. Unconfigured tubes get 1.
    pub fn limit(mut self, tube: impl Into<String>, limit: usize) -> Self {
        self.limits.insert(tube.into(), limit);
        self
    }

    /// Change-notification sink; without one, changes are dropped.
    pub fn on_task_change(mut self, sink: impl TaskChangeSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Clock override, for deterministic tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SpoolQueue, SpoolError> {
        for (tube, &value) in &self.limits {
            if value == 0 {
                return Err(SpoolError::InvalidLimit {
                    tube: tube.clone(),
                    value,
                });
            }
        }

        let ttl = self.ttl.map(micros).unwrap_or(TIMEOUT_INFINITY_US);
        let defaults = QueueDefaults {
            ttl,
            ttr: self.ttr.map(micros).unwrap_or(ttl),
            pri: self.pri.unwrap_or(0),
        };

        let state = Arc::new(Mutex::new(QueueState {
            store: IndexedStore::new(),
            limits: self.limits,
        }));
        let notify = Arc::new(Notify::new());
        let sink = self.sink.unwrap_or_else(|| Arc::new(NoopSink));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let timekeeper = Timekeeper::spawn(
            Arc::clone(&state),
            Arc::clone(&notify),
            Arc::clone(&sink),
            Arc::clone(&clock),
        );

        Ok(SpoolQueue {
            state,
            notify,
            sink,
            clock,
            defaults,
            timekeeper,
        })
    }
}
