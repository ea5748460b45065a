//! External market data feeds.
//!
//! [`MarketFeed`] is the seam between the sampling pipeline and the outside
//! world; [`CmcMarketFeed`] is the production implementation over a blocking
//! HTTP client.

use std::sync::RwLock;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::{self, SourceConfig};
use crate::error::{BitforcastError, Result};
use crate::models::Dominance;

/// A source of live market data.
pub trait MarketFeed: Send + Sync {
    /// Fetch the current quote, rounded to 2 decimal places.
    fn latest_price(&self) -> Result<f64>;

    /// Fetch BTC/USDT market-share percentages.
    ///
    /// Callers that only display the result should fall back to
    /// `Dominance::default()` (all zeros) on failure.
    fn dominance(&self) -> Result<Dominance>;
}

// ---------------------------------------------------------------------------
// CmcMarketFeed
// ---------------------------------------------------------------------------

/// Production feed: quotes from the configured CoinMarketCap-style endpoint,
/// dominance from the public global-market endpoint.
pub struct CmcMarketFeed {
    client: Client,
    config: RwLock<SourceConfig>,
}

impl CmcMarketFeed {
    /// Build the feed with a fixed request timeout.
    pub fn new(config: SourceConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            config: RwLock::new(config),
        })
    }

    /// Current source configuration.
    pub fn config(&self) -> SourceConfig {
        self.lock_config().clone()
    }

    /// Replace the quote URL and API key used by subsequent fetches.
    pub fn set_config(&self, config: SourceConfig) {
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    }

    fn lock_config(&self) -> std::sync::RwLockReadGuard<'_, SourceConfig> {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MarketFeed for CmcMarketFeed {
    fn latest_price(&self) -> Result<f64> {
        let (url, api_key) = {
            let cfg = self.lock_config();
            (cfg.quote_url.clone(), cfg.api_key.clone())
        };

        debug!(%url, "fetching quote");
        let resp = self
            .client
            .get(&url)
            .header("Accepts", "application/json")
            .header("X-CMC_PRO_API_KEY", &api_key)
            .send()?
            .error_for_status()?;

        extract_quote_price(&resp.json()?)
    }

    fn dominance(&self) -> Result<Dominance> {
        debug!(url = config::GLOBAL_MARKET_URL, "fetching dominance");
        let resp = self
            .client
            .get(config::GLOBAL_MARKET_URL)
            .send()?
            .error_for_status()?;

        extract_dominance(&resp.json()?)
    }
}

// ---------------------------------------------------------------------------
// Response extraction
// ---------------------------------------------------------------------------

/// Pull the BTC/USDT price out of a latest-quotes response body, rounded to
/// 2 decimal places.
pub fn extract_quote_price(body: &serde_json::Value) -> Result<f64> {
    let price = body
        .get("data")
        .and_then(|d| d.get("BTC"))
        .and_then(|b| b.get("quote"))
        .and_then(|q| q.get("USDT"))
        .and_then(|u| u.get("price"))
        .and_then(|p| p.as_f64())
        .ok_or_else(|| {
            BitforcastError::Parse("missing data.BTC.quote.USDT.price in quote response".into())
        })?;

    Ok((price * 100.0).round() / 100.0)
}

/// Pull both market-share percentages out of a global-market response body.
pub fn extract_dominance(body: &serde_json::Value) -> Result<Dominance> {
    let shares = body
        .get("data")
        .and_then(|d| d.get("market_cap_percentage"))
        .ok_or_else(|| {
            BitforcastError::Parse("missing data.market_cap_percentage in market response".into())
        })?;

    let field = |name: &str| -> Result<f64> {
        shares.get(name).and_then(|v| v.as_f64()).ok_or_else(|| {
            BitforcastError::Parse(format!("missing market_cap_percentage.{name}"))
        })
    };

    Ok(Dominance {
        btc: field("btc")?,
        usdt: field("usdt")?,
    })
}
