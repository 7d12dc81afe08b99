use serde::{Deserialize, Serialize};

/// Number of stored tasks per status.
///
/// DONE is absent: a finished task leaves the store, so it only ever shows up
/// in change notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub ready: usize,
    pub taken: usize,
    pub delayed: usize,
    pub blocked: usize,
    pub buried: usize,
}
