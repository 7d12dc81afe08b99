//! Task record: the stored tuple and its state transitions.

use serde::{Deserialize, Serialize};

use super::{TaskId, TaskStatus};

/// The full stored task.
///
/// Design:
/// - This is the single source of truth for task state; indexes hold keys
///   derived from it.
/// - All timestamps and durations are `u64` microseconds on the wall clock.
/// - `next_event` is the earliest moment the timekeeper is obliged to act on
///   the task: end of delay (Delayed), ttr deadline (Taken), ttl deadline
///   (Ready, Blocked, Buried).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    pub next_event: u64,
    pub ttl: u64,
    pub ttr: u64,
    pub pri: i64,
    pub created: u64,
    pub tube: String,
    pub data: serde_json::Value,
}

impl TaskRecord {
    /// Wall-clock moment this task dies by ttl.
    pub fn ttl_deadline(&self) -> u64 {
        self.created.saturating_add(self.ttl)
    }

    /// The public projection: id, status, payload.
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            status: self.status,
            data: self.data.clone(),
        }
    }

    /// Ready -> Taken; the consumer now races the ttr deadline.
    pub(crate) fn start_run(&mut self, now: u64) {
        self.status = TaskStatus::Taken;
        self.next_event = now.saturating_add(self.ttr);
    }

    /// Back to the tube's waiting line, keeping the original ttl deadline.
    pub(crate) fn park(&mut self) {
        self.status = TaskStatus::Blocked;
        self.next_event = self.ttl_deadline();
    }

    /// Release with a delay: the ttl deadline moves out by the same amount.
    pub(crate) fn delay_until(&mut self, now: u64, delay: u64) {
        self.status = TaskStatus::Delayed;
        self.ttl = self.ttl.saturating_add(delay);
        self.next_event = now.saturating_add(delay);
    }

    /// Leave a waiting state for `to` (Ready or Blocked), watching ttl again.
    pub(crate) fn promote(&mut self, to: TaskStatus) {
        self.status = to;
        self.next_event = self.ttl_deadline();
    }

    /// Taken -> Ready on ttr expiry.
    pub(crate) fn requeue(&mut self) {
        self.status = TaskStatus::Ready;
        self.next_event = self.ttl_deadline();
    }

    /// Bury in place; `next_event` keeps whatever deadline it had.
    pub(crate) fn bury(&mut self) {
        self.status = TaskStatus::Buried;
    }

    /// Buried -> `to` (Ready or Blocked); `next_event` untouched.
    pub(crate) fn kick_to(&mut self, to: TaskStatus) {
        self.status = to;
    }

    /// Give the task `delta` more microseconds of everything.
    pub(crate) fn extend(&mut self, delta: u64) {
        self.next_event = self.next_event.saturating_add(delta);
        self.ttl = self.ttl.saturating_add(delta);
        self.ttr = self.ttr.saturating_add(delta);
    }
}

/// What callers outside the queue see of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub status: TaskStatus,
    pub data: serde_json::Value,
}
