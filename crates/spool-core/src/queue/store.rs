//! Indexed task store.
//!
//! A `BTreeMap` primary keyed by id plus three ordered secondary indexes:
//! - `by_pri`: (status, pri, id) — best take/kick candidate per status
//! - `by_deadline`: (status, next_event, id) — earliest deadline per status
//! - `by_tube`: (status, tube, id) — oldest task per (status, tube), and
//!   capped in-flight counts for admission
//!
//! Every mutation goes through `insert`/`update`/`remove`, which keep all
//! four structures in lockstep; nothing else touches the sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{TaskId, TaskRecord, TaskStatus};
use crate::observability::QueueCounts;

type PriKey = (TaskStatus, i64, TaskId);
type DeadlineKey = (TaskStatus, u64, TaskId);
type TubeKey = (TaskStatus, String, TaskId);

#[derive(Debug, Default)]
pub(crate) struct IndexedStore {
    primary: BTreeMap<TaskId, TaskRecord>,
    by_pri: BTreeSet<PriKey>,
    by_deadline: BTreeSet<DeadlineKey>,
    by_tube: BTreeSet<TubeKey>,
}

impl IndexedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Id for the next insert: highest stored id plus one, 0 when empty.
    pub(crate) fn next_id(&self) -> TaskId {
        self.primary
            .keys()
            .next_back()
            .map_or(TaskId::ZERO, |id| id.next())
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.primary.get(&id)
    }

    pub(crate) fn insert(&mut self, rec: TaskRecord) {
        self.by_pri.insert((rec.status, rec.pri, rec.id));
        self.by_deadline.insert((rec.status, rec.next_event, rec.id));
        self.by_tube.insert((rec.status, rec.tube.clone(), rec.id));
        self.primary.insert(rec.id, rec);
    }

    pub(crate) fn remove(&mut self, id: TaskId) -> Option<TaskRecord> {
        let rec = self.primary.remove(&id)?;
        self.by_pri.remove(&(rec.status, rec.pri, rec.id));
        self.by_deadline.remove(&(rec.status, rec.next_event, rec.id));
        self.by_tube.remove(&(rec.status, rec.tube.clone(), rec.id));
        Some(rec)
    }

    /// Apply `f` to the record with `id`, re-indexing around the mutation.
    /// Returns a snapshot of the record after the change.
    pub(crate) fn update<F>(&mut self, id: TaskId, f: F) -> Option<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let rec = self.primary.get_mut(&id)?;
        self.by_pri.remove(&(rec.status, rec.pri, rec.id));
        self.by_deadline.remove(&(rec.status, rec.next_event, rec.id));
        self.by_tube.remove(&(rec.status, rec.tube.clone(), rec.id));

        f(rec);

        self.by_pri.insert((rec.status, rec.pri, rec.id));
        self.by_deadline.insert((rec.status, rec.next_event, rec.id));
        self.by_tube.insert((rec.status, rec.tube.clone(), rec.id));
        Some(rec.clone())
    }

    /// Best candidate in `status`: smallest pri, then smallest id.
    pub(crate) fn min_by_pri(&self, status: TaskStatus) -> Option<TaskId> {
        let lo = (status, i64::MIN, TaskId::ZERO);
        let hi = (status, i64::MAX, TaskId::MAX);
        self.by_pri.range(lo..=hi).next().map(|&(_, _, id)| id)
    }

    /// Earliest `next_event` in `status`.
    pub(crate) fn min_deadline(&self, status: TaskStatus) -> Option<(TaskId, u64)> {
        let lo = (status, u64::MIN, TaskId::ZERO);
        let hi = (status, u64::MAX, TaskId::MAX);
        self.by_deadline
            .range(lo..=hi)
            .next()
            .map(|&(_, deadline, id)| (id, deadline))
    }

    /// Oldest task (smallest id) with `status` in `tube`.
    pub(crate) fn min_in_tube(&self, status: TaskStatus, tube: &str) -> Option<TaskId> {
        let lo = (status, tube.to_owned(), TaskId::ZERO);
        let hi = (status, tube.to_owned(), TaskId::MAX);
        self.by_tube.range(lo..=hi).next().map(|(_, _, id)| *id)
    }

    /// Number of tasks with `status` in `tube`, probing at most `cap` index
    /// entries.
    pub(crate) fn count_in_tube(&self, status: TaskStatus, tube: &str, cap: usize) -> usize {
        let lo = (status, tube.to_owned(), TaskId::ZERO);
        let hi = (status, tube.to_owned(), TaskId::MAX);
        self.by_tube.range(lo..=hi).take(cap).count()
    }

    pub(crate) fn len(&self) -> usize {
        self.primary.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.primary.values()
    }

    pub(crate) fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for rec in self.primary.values() {
            match rec.status {
                TaskStatus::Ready => counts.ready += 1,
                TaskStatus::Taken => counts.taken += 1,
                TaskStatus::Delayed => counts.delayed += 1,
                TaskStatus::Blocked => counts.blocked += 1,
                TaskStatus::Buried => counts.buried += 1,
                TaskStatus::Done => {}
            }
        }
        counts
    }
}
