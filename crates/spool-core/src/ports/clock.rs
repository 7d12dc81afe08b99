//! Clock port.
//!
//! The queue stores every timestamp and duration as `u64` microseconds since
//! the Unix epoch, so the port speaks microseconds directly.
//!
//! Implementations:
//! - **SystemClock**: production, reads the wall clock.
//! - **ManualClock**: tests, a fixed time that only moves when advanced.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Provides the current wall-clock time in microseconds.
pub trait Clock: Send + Sync {
    fn now_micros(&self) -> u64;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        // Pre-epoch wall clocks clamp to zero rather than wrapping.
        Utc::now().timestamp_micros().max(0) as u64
    }
}

/// Test clock: time stands still until `advance` is called.
///
/// Lets deadline-driven tests state "1.5 seconds pass" without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new(micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(micros),
        }
    }

    pub fn advance(&self, delta_micros: u64) {
        self.micros.fetch_add(delta_micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_moves_with_the_wall() {
        let clock = SystemClock;
        let before = Utc::now().timestamp_micros() as u64;
        let actual = clock.now_micros();
        let after = Utc::now().timestamp_micros() as u64;

        assert!(actual >= before);
        assert!(actual <= after);
    }

    #[test]
    fn manual_clock_is_deterministic() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_micros(), 1_000);
        assert_eq!(clock.now_micros(), 1_000);

        clock.advance(500);
        assert_eq!(clock.now_micros(), 1_500);
    }
}
