//! Queue defaults and per-call options.

use std::time::Duration;

/// 500 years of microseconds: the practical "never expires" default for ttl
/// (and through it, ttr).
pub(crate) const TIMEOUT_INFINITY_US: u64 = 500 * 365 * 86_400 * 1_000_000;

pub(crate) fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

/// Queue-wide defaults applied when a put does not override them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueDefaults {
    pub(crate) ttl: u64,
    pub(crate) ttr: u64,
    pub(crate) pri: i64,
}

/// Per-put overrides. Anything left unset falls back to the queue defaults;
/// the tube defaults to `""`.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub delay: Option<Duration>,
    pub ttl: Option<Duration>,
    pub ttr: Option<Duration>,
    pub pri: Option<i64>,
    pub tube: Option<String>,
}

impl PutOptions {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttr(mut self, ttr: Duration) -> Self {
        self.ttr = Some(ttr);
        self
    }

    pub fn pri(mut self, pri: i64) -> Self {
        self.pri = Some(pri);
        self
    }

    pub fn tube(mut self, tube: impl Into<String>) -> Self {
        self.tube = Some(tube.into());
        self
    }
}

/// Options for release. Without a delay the task goes back to its tube's
/// waiting line; with one it is parked as Delayed and its ttl moves out by
/// the same amount.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    pub delay: Option<Duration>,
}

impl ReleaseOptions {
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micros_saturates() {
        assert_eq!(micros(Duration::from_micros(25)), 25);
        assert_eq!(micros(Duration::MAX), u64::MAX);
    }

    #[test]
    fn put_options_chain() {
        let opts = PutOptions::default()
            .pri(3)
            .tube("mail")
            .delay(Duration::from_secs(1));
        assert_eq!(opts.pri, Some(3));
        assert_eq!(opts.tube.as_deref(), Some("mail"));
        assert_eq!(opts.delay, Some(Duration::from_secs(1)));
        assert!(opts.ttl.is_none());
    }
}
