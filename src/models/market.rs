use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dominance — market-share percentages for display adapters
// ---------------------------------------------------------------------------

/// BTC and USDT shares of total market capitalization, in percent.
///
/// The zero-valued [`Default`] is the documented display fallback when the
/// market-share endpoint cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dominance {
    pub btc: f64,
    pub usdt: f64,
}
