//! Limit accountant: per-tube admission and promotion.
//!
//! Invariant maintained across every operation: for each tube,
//! ready + taken <= limit(tube), with limit defaulting to 1.

use std::collections::HashMap;

use super::store::IndexedStore;
use crate::domain::{TaskRecord, TaskStatus};

pub(crate) fn tube_limit(limits: &HashMap<String, usize>, tube: &str) -> usize {
    limits.get(tube).copied().unwrap_or(1)
}

/// Admission state for a task entering `tube`: Ready while the tube has a
/// free in-flight slot, Blocked otherwise.
///
/// Taken is counted first so a tube saturated by running tasks
/// short-circuits without probing the Ready range; both probes are capped at
/// the limit, so admission cost is bounded by the limit, not the tube
/// population.
pub(crate) fn admit(
    store: &IndexedStore,
    limits: &HashMap<String, usize>,
    tube: &str,
) -> TaskStatus {
    let cap = tube_limit(limits, tube);
    let mut in_flight = store.count_in_tube(TaskStatus::Taken, tube, cap);
    if in_flight < cap {
        in_flight += store.count_in_tube(TaskStatus::Ready, tube, cap - in_flight);
    }
    if in_flight < cap {
        TaskStatus::Ready
    } else {
        TaskStatus::Blocked
    }
}

/// Promote the oldest Blocked task in `tube`, if any.
///
/// Called whenever a Ready or Taken task leaves the tube; age order (the id)
/// decides who gets the freed slot.
pub(crate) fn unblock_one(store: &mut IndexedStore, tube: &str) -> Option<TaskRecord> {
    let id = store.min_in_tube(TaskStatus::Blocked, tube)?;
    store.update(id, |rec| rec.promote(TaskStatus::Ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;

    fn rec(id: u64, status: TaskStatus, tube: &str) -> TaskRecord {
        TaskRecord {
            id: TaskId::new(id),
            status,
            next_event: 1_000,
            ttl: 1_000,
            ttr: 100,
            pri: 0,
            created: 0,
            tube: tube.into(),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn empty_tube_admits_ready() {
        let store = IndexedStore::new();
        let limits = HashMap::new();
        assert_eq!(admit(&store, &limits, "a"), TaskStatus::Ready);
    }

    #[test]
    fn default_limit_is_one() {
        let mut store = IndexedStore::new();
        store.insert(rec(0, TaskStatus::Ready, "a"));
        let limits = HashMap::new();

        assert_eq!(admit(&store, &limits, "a"), TaskStatus::Blocked);
        // Other tubes are unaffected.
        assert_eq!(admit(&store, &limits, "b"), TaskStatus::Ready);
    }

    #[test]
    fn taken_and_ready_both_occupy_slots() {
        let mut store = IndexedStore::new();
        store.insert(rec(0, TaskStatus::Taken, "a"));
        store.insert(rec(1, TaskStatus::Ready, "a"));
        let limits = HashMap::from([("a".to_string(), 3)]);

        assert_eq!(admit(&store, &limits, "a"), TaskStatus::Ready);

        store.insert(rec(2, TaskStatus::Taken, "a"));
        assert_eq!(admit(&store, &limits, "a"), TaskStatus::Blocked);
    }

    #[test]
    fn waiting_states_do_not_occupy_slots() {
        let mut store = IndexedStore::new();
        store.insert(rec(0, TaskStatus::Blocked, "a"));
        store.insert(rec(1, TaskStatus::Delayed, "a"));
        store.insert(rec(2, TaskStatus::Buried, "a"));
        let limits = HashMap::new();

        assert_eq!(admit(&store, &limits, "a"), TaskStatus::Ready);
    }

    #[test]
    fn unblock_one_picks_the_oldest() {
        let mut store = IndexedStore::new();
        store.insert(rec(3, TaskStatus::Blocked, "a"));
        store.insert(rec(5, TaskStatus::Blocked, "a"));
        store.insert(rec(4, TaskStatus::Blocked, "b"));

        let promoted = unblock_one(&mut store, "a").unwrap();
        assert_eq!(promoted.id, TaskId::new(3));
        assert_eq!(promoted.status, TaskStatus::Ready);
        assert_eq!(
            store.get(TaskId::new(5)).unwrap().status,
            TaskStatus::Blocked
        );
        assert_eq!(
            store.get(TaskId::new(4)).unwrap().status,
            TaskStatus::Blocked
        );
    }

    #[test]
    fn unblock_one_on_empty_tube_is_none() {
        let mut store = IndexedStore::new();
        assert!(unblock_one(&mut store, "a").is_none());
    }
}
