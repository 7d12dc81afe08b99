//! spool-core
//!
//! In-memory priority task queue with tubes (string-keyed sub-channels with
//! per-tube concurrency limits), delayed tasks, time-to-live, and
//! time-to-run.
//!
//! Module map:
//! - domain: ids, statuses, task records, change events
//! - ports: clock and change-notification seams
//! - queue: the queue port, the in-memory implementation, store and limits
//! - timekeeper: the worker driving delayed/ttl/ttr transitions
//! - observability: per-status counts
//! - error: crate-level error types

pub mod domain;
pub mod error;
pub mod observability;
pub mod ports;
pub mod queue;
mod timekeeper;
