use std::path::PathBuf;
use std::time::Duration;

/// Default quote endpoint (CoinMarketCap latest-quotes, BTC in USDT).
pub const QUOTE_URL: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest?symbol=BTC&convert=USDT";

/// Global market data endpoint used for dominance percentages (no auth).
pub const GLOBAL_MARKET_URL: &str = "https://api.coingecko.com/api/v3/global";

/// Timestamp format stored in the database. Minute resolution; sorts
/// lexicographically in chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Number of future points produced by a forecast.
pub const FORECAST_HORIZON: usize = 30;

pub fn default_db_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("bitforcast").join("prices.db")
    } else {
        PathBuf::from(".bitforcast-prices.db")
    }
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Where and how to fetch quotes. Both fields are runtime mutable; changing
/// either invalidates the stored history (see `Bitforcast::update_source`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub quote_url: String,
    pub api_key: String,
}

impl SourceConfig {
    pub fn new(quote_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            quote_url: quote_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            quote_url: QUOTE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// PollerConfig
// ---------------------------------------------------------------------------

/// Cadence and timeout settings for the sampling pipeline.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Minimum interval between two granted fetches.
    pub min_fetch_interval: Duration,
    /// Interval at which the scheduler fires the price and dominance tasks.
    pub cadence: Duration,
    /// HTTP timeout for the quote request.
    pub http_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            min_fetch_interval: Duration::from_secs(60),
            cadence: Duration::from_secs(60),
            http_timeout: Duration::from_secs(10),
        }
    }
}
