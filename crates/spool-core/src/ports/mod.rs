//! Ports: seams between the queue and its host environment.
//!
//! Each trait hides an external concern (the wall clock, the change
//! callback) so production and test wiring can differ.

pub mod clock;
pub mod sink;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::sink::{NoopSink, TaskChangeSink};
