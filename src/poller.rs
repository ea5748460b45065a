//! The sampling pipeline: permit → fetch → classify → append → notify.
//!
//! The poller is a two-state machine (`Idle`, `Fetching`) tracked by an
//! atomic flag with a drop guard, so every exit path, error paths included,
//! lands back in `Idle`. Pipeline errors never escape [`Poller::poll_price`]:
//! they are logged, surfaced as a one-line message, and the store is left
//! untouched. There is no retry inside a tick; the next scheduler tick is
//! the next opportunity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use tracing::{info, warn};

use crate::classify::classify;
use crate::config::TIMESTAMP_FORMAT;
use crate::error::Result;
use crate::models::{Dominance, PollUpdate, PriceSample};
use crate::rate_limit::RateLimiter;
use crate::source::MarketFeed;
use crate::store::PriceStore;

/// Notification delivered to subscribers.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A new sample was stored; carries the refreshed aggregates.
    Price(PollUpdate),
    /// Fresh market-share percentages (zero-valued on fetch failure).
    Dominance(Dominance),
    /// A poll attempt failed; one-line human-readable description.
    Failure(String),
}

/// Why a poll attempt did not fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch is in flight; the trigger is dropped, never run in
    /// parallel.
    InFlight,
    /// The minimum fetch interval has not elapsed yet.
    RateLimited,
}

/// Outcome of a single poll attempt.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Completed(PollUpdate),
    Skipped(SkipReason),
    Failed(String),
}

type Subscriber = Arc<dyn Fn(&PollEvent) + Send + Sync>;

pub struct Poller {
    store: Arc<PriceStore>,
    feed: Arc<dyn MarketFeed>,
    limiter: RateLimiter,
    fetching: AtomicBool,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Poller {
    pub fn new(store: Arc<PriceStore>, feed: Arc<dyn MarketFeed>, limiter: RateLimiter) -> Self {
        Self {
            store,
            feed,
            limiter,
            fetching: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a callback for poll notifications. Safe to call from inside
    /// a callback; the new subscriber sees events from the next poll on.
    pub fn subscribe(&self, subscriber: impl Fn(&PollEvent) + Send + Sync + 'static) {
        self.lock_subscribers().push(Arc::new(subscriber));
    }

    /// Run one poll attempt (timer tick or manual trigger).
    pub fn poll_price(&self) -> PollOutcome {
        // Idle -> Fetching; a concurrent trigger loses and is dropped.
        if self
            .fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return PollOutcome::Skipped(SkipReason::InFlight);
        }
        let _idle = IdleGuard(&self.fetching);

        if !self.limiter.try_acquire() {
            return PollOutcome::Skipped(SkipReason::RateLimited);
        }

        match self.fetch_and_store() {
            Ok(update) => {
                info!(
                    price = update.sample.price,
                    status = %update.sample.status,
                    "price sample stored"
                );
                self.notify(&PollEvent::Price(update.clone()));
                PollOutcome::Completed(update)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "poll failed; store unchanged");
                self.notify(&PollEvent::Failure(message.clone()));
                PollOutcome::Failed(message)
            }
        }
    }

    /// Fetch market-share percentages and notify subscribers.
    ///
    /// Failures degrade to the zero-valued display fallback instead of an
    /// error; the next tick retries naturally.
    pub fn poll_dominance(&self) -> Dominance {
        let dominance = match self.feed.dominance() {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "dominance fetch failed; using zero fallback");
                Dominance::default()
            }
        };
        self.notify(&PollEvent::Dominance(dominance));
        dominance
    }

    /// The fallible part of the pipeline. The store is only modified by the
    /// single `append` at the end, so any earlier failure leaves it as-is.
    fn fetch_and_store(&self) -> Result<PollUpdate> {
        let price = self.feed.latest_price()?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

        let previous = self.store.latest()?.map(|s| s.price);
        let status = classify(price, previous);
        let id = self.store.append(&timestamp, price, status)?;

        Ok(PollUpdate {
            sample: PriceSample {
                id,
                timestamp,
                price,
                status,
            },
            average: self.store.average()?,
            counts: self.store.counts_by_status()?,
        })
    }

    fn notify(&self, event: &PollEvent) {
        // Snapshot the list so callbacks run without the lock held; a
        // callback may re-enter `subscribe` without deadlocking.
        let subscribers: Vec<Subscriber> = self.lock_subscribers().clone();
        for subscriber in &subscribers {
            subscriber(event);
        }
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resets the state machine to `Idle` when dropped.
struct IdleGuard<'a>(&'a AtomicBool);

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
