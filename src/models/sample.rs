use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PriceStatus — direction relative to the previous stored sample
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceStatus {
    Higher,
    Lower,
    Unchanged,
}

impl PriceStatus {
    /// All status values, in the order aggregate views display them.
    pub const ALL: [PriceStatus; 3] =
        [PriceStatus::Higher, PriceStatus::Lower, PriceStatus::Unchanged];

    /// Text stored in the `price_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceStatus::Higher => "Higher",
            PriceStatus::Lower => "Lower",
            PriceStatus::Unchanged => "Unchanged",
        }
    }
}

impl fmt::Display for PriceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Higher" => Ok(PriceStatus::Higher),
            "Lower" => Ok(PriceStatus::Lower),
            "Unchanged" => Ok(PriceStatus::Unchanged),
            other => Err(format!("unknown price status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// PriceSample — one immutable row of the price log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Sequence-assigned surrogate key, strictly increasing with insertion.
    pub id: i64,
    /// Minute-resolution wall-clock time (`%Y-%m-%d %H:%M`).
    pub timestamp: String,
    pub price: f64,
    pub status: PriceStatus,
}

impl PriceSample {
    /// Price expressed per satoshi, rounded to 8 decimal places. Display
    /// helper for adapters; not persisted.
    pub fn satoshi_price(&self) -> f64 {
        (self.price / 100_000_000.0 * 1e8).round() / 1e8
    }
}

// ---------------------------------------------------------------------------
// PollUpdate — subscriber notification payload after a successful poll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PollUpdate {
    pub sample: PriceSample,
    /// Mean of all stored prices, rounded to 2 decimal places (0 when empty).
    pub average: f64,
    /// Counts per status; every status key is present, missing ones are 0.
    pub counts: HashMap<PriceStatus, u64>,
}
