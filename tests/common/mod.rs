//! Shared fixtures for the bitforcast integration tests.
//!
//! Provides an in-memory store seeder and a scripted [`MarketFeed`] whose
//! responses are queued up front, so poller tests run without any network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use bitforcast::{classify, BitforcastError, Dominance, MarketFeed, PriceStore};

/// Minute-resolution timestamp `minute` minutes into a fixed test hour.
pub fn minute_ts(minute: u32) -> String {
    format!("2024-05-01 10:{minute:02}")
}

/// In-memory store seeded with `prices` at one-minute spacing, each sample
/// classified against its predecessor the way the poller would.
pub fn seed_store(prices: &[f64]) -> PriceStore {
    let store = PriceStore::open_in_memory().unwrap();
    let mut previous = None;
    for (i, price) in prices.iter().enumerate() {
        let status = classify(*price, previous);
        store.append(&minute_ts(i as u32), *price, status).unwrap();
        previous = Some(*price);
    }
    store
}

// ---------------------------------------------------------------------------
// ScriptedFeed
// ---------------------------------------------------------------------------

type Scripted<T> = Mutex<VecDeque<Result<T, String>>>;

/// Market feed replaying pre-queued responses. An exhausted script fails the
/// fetch, which the pipeline treats like any other error.
pub struct ScriptedFeed {
    prices: Scripted<f64>,
    dominance: Scripted<Dominance>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            prices: Mutex::new(VecDeque::new()),
            dominance: Mutex::new(VecDeque::new()),
        }
    }

    /// Convenience: a feed that will serve these prices in order.
    pub fn with_prices(prices: &[f64]) -> Self {
        let feed = Self::new();
        for p in prices {
            feed.push_price(*p);
        }
        feed
    }

    pub fn push_price(&self, price: f64) {
        self.prices.lock().unwrap().push_back(Ok(price));
    }

    pub fn push_price_error(&self, message: &str) {
        self.prices.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn push_dominance(&self, dominance: Dominance) {
        self.dominance.lock().unwrap().push_back(Ok(dominance));
    }

    pub fn push_dominance_error(&self, message: &str) {
        self.dominance.lock().unwrap().push_back(Err(message.into()));
    }
}

impl MarketFeed for ScriptedFeed {
    fn latest_price(&self) -> bitforcast::Result<f64> {
        self.prices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("price script exhausted".into()))
            .map_err(BitforcastError::Parse)
    }

    fn dominance(&self) -> bitforcast::Result<Dominance> {
        self.dominance
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("dominance script exhausted".into()))
            .map_err(BitforcastError::Parse)
    }
}
