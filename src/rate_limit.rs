//! Minimum-interval permit for external fetches.
//!
//! Over-frequent triggers are dropped, not queued: a denied caller skips the
//! fetch entirely and waits for the next tick, since a quote is always
//! fetched fresh rather than replayed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Grants at most one fetch permit per `min_interval`.
///
/// The check-and-update runs under a single mutex, so concurrent callers
/// (scheduled tick and manual trigger) can never both win the same instant.
pub struct RateLimiter {
    min_interval: Duration,
    last_granted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_granted: Mutex::new(None),
        }
    }

    /// Try to acquire a permit for a fetch happening now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Clock-injectable variant of [`try_acquire`](Self::try_acquire).
    ///
    /// Grants iff no fetch has been granted yet, or at least `min_interval`
    /// has elapsed since the last grant. On grant, `now` becomes the new
    /// last-granted instant.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = self
            .last_granted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let granted = match *last {
            None => true,
            Some(prev) => now.duration_since(prev) >= self.min_interval,
        };

        if granted {
            *last = Some(now);
        }
        granted
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
