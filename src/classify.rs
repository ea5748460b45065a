//! Directional classification of a new price against the previous stored one.

use crate::models::PriceStatus;

/// Classify `new_price` relative to the immediately preceding stored price.
///
/// The very first sample has no predecessor and is always `Unchanged`.
/// Comparison is strict; equal prices are also `Unchanged`.
pub fn classify(new_price: f64, previous: Option<f64>) -> PriceStatus {
    match previous {
        None => PriceStatus::Unchanged,
        Some(prev) if new_price > prev => PriceStatus::Higher,
        Some(prev) if new_price < prev => PriceStatus::Lower,
        Some(_) => PriceStatus::Unchanged,
    }
}
