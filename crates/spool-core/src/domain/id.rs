//! Task identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a task.
///
/// Ids are dense monotone `u64`s: a new task gets the highest stored id plus
/// one (or 0 into an empty store), so the primary index doubles as the id
/// allocator and no separate counter exists.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    pub const ZERO: TaskId = TaskId(0);
    pub const MAX: TaskId = TaskId(u64::MAX);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The id a task inserted after this one would get.
    pub(crate) fn next(self) -> TaskId {
        TaskId(self.0 + 1)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert_eq!(TaskId::new(7).to_string(), "task-7");
    }

    #[test]
    fn ids_order_by_value() {
        assert!(TaskId::new(1) < TaskId::new(2));
        assert!(TaskId::ZERO < TaskId::MAX);
    }

    #[test]
    fn serializes_as_plain_number() {
        let id = TaskId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: TaskId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }
}
