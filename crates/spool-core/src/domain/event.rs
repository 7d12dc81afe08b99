//! Change-event kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The operation behind a task change notification.
///
/// Timekeeper-driven transitions and the internal promotion of a blocked
/// task carry no kind (`None` at the callback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEvent {
    Put,
    Take,
    Release,
    Delete,
    Bury,
    Kick,
    Touch,
}

impl TaskEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskEvent::Put => "put",
            TaskEvent::Take => "take",
            TaskEvent::Release => "release",
            TaskEvent::Delete => "delete",
            TaskEvent::Bury => "bury",
            TaskEvent::Kick => "kick",
            TaskEvent::Touch => "touch",
        }
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
