//! Task lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
///
/// Transitions:
/// - put: -> Delayed | Ready | Blocked
/// - take: Ready -> Taken
/// - release: Taken -> Blocked | Delayed (then the oldest Blocked peer in the
///   tube is promoted, which may be the released task itself)
/// - bury: -> Buried; kick: Buried -> Ready | Blocked
/// - timekeeper: Delayed -> Ready | Blocked, Taken -> Ready (ttr expiry),
///   Ready | Blocked | Buried -> Done (ttl expiry)
/// - delete: -> Done
///
/// `Ord` exists only so statuses can participate in index key tuples; every
/// index consumer keys on status equality, never on which status sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Eligible for take.
    Ready,

    /// Held by a consumer, racing its ttr deadline.
    Taken,

    /// Waiting out an initial or release delay.
    Delayed,

    /// Waiting for a free slot in its tube.
    Blocked,

    /// Parked by a consumer until a kick.
    Buried,

    /// Gone from the store; appears only in change notifications.
    Done,
}

impl TaskStatus {
    /// Is this a terminal state (task no longer stored)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Does this task occupy a slot in its tube's concurrency budget?
    pub fn is_in_flight(self) -> bool {
        matches!(self, TaskStatus::Ready | TaskStatus::Taken)
    }
}
