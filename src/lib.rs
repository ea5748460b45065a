//! Bitcoin price sampling, persistence, and forecasting toolkit.
//!
//! Polls a quote endpoint on a fixed cadence, classifies each price against
//! the previous stored sample, appends it to a local DuckDB table, and keeps
//! derived aggregates (average, counts per status) fresh for subscribers.
//! Forecasting is a separate, on-demand read path over the same store.
//!
//! GUI rendering, chart drawing, and confirmation dialogs are deliberately
//! out of scope: adapters consume the poller's notifications and the store's
//! query surface.
//!
//! # Quick start
//!
//! ```no_run
//! use bitforcast::{Bitforcast, ForecastModel, PollEvent};
//!
//! let app = Bitforcast::builder().api_key("my-key").build().unwrap();
//!
//! app.poller().subscribe(|event| {
//!     if let PollEvent::Price(update) = event {
//!         println!("{} ({})", update.sample.price, update.sample.status);
//!     }
//! });
//!
//! // Poll once by hand, or keep a scheduler running:
//! app.poller().poll_price();
//! let _scheduler = app.start_scheduler();
//!
//! // Later, forecast 30 minutes ahead with a caller-supplied bias:
//! let points = app.forecast(ForecastModel::LinearTrend, 5.0).unwrap();
//! # let _ = points;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod models;
pub mod poller;
pub mod rate_limit;
pub mod scheduler;
pub mod source;
pub mod store;

pub use classify::classify;
pub use config::{PollerConfig, SourceConfig};
pub use error::{BitforcastError, Result};
pub use export::{export_csv, ExportOutcome};
pub use forecast::{forecast_series, resample_minutes, ForecastModel};
pub use models::{Dominance, PollUpdate, PriceSample, PriceStatus};
pub use poller::{PollEvent, PollOutcome, Poller, SkipReason};
pub use rate_limit::RateLimiter;
pub use scheduler::{Scheduler, Task};
pub use source::{extract_dominance, extract_quote_price, CmcMarketFeed, MarketFeed};
pub use store::{PriceStore, SampleOrder};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// BitforcastBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Bitforcast`] instance.
pub struct BitforcastBuilder {
    db_path: Option<PathBuf>,
    in_memory: bool,
    source: SourceConfig,
    poller: PollerConfig,
    feed: Option<Arc<dyn MarketFeed>>,
}

impl Default for BitforcastBuilder {
    fn default() -> Self {
        Self {
            db_path: None,
            in_memory: false,
            source: SourceConfig::default(),
            poller: PollerConfig::default(),
            feed: None,
        }
    }
}

impl BitforcastBuilder {
    /// Set the database file location.
    ///
    /// If not set, the platform-appropriate data directory is used
    /// (e.g. `~/.local/share/bitforcast/prices.db` on Linux).
    pub fn db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.db_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the sample log in memory instead of on disk. History is lost on
    /// drop; intended for tests and demos.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Set the quote API key sent in the `X-CMC_PRO_API_KEY` header.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.source.api_key = key.into();
        self
    }

    /// Override the quote endpoint URL.
    pub fn quote_url(mut self, url: impl Into<String>) -> Self {
        self.source.quote_url = url.into();
        self
    }

    /// Override cadence, minimum fetch interval, and HTTP timeout.
    pub fn poller_config(mut self, config: PollerConfig) -> Self {
        self.poller = config;
        self
    }

    /// Replace the HTTP-backed market feed (tests inject scripted feeds
    /// here). [`Bitforcast::update_source`] has no effect on a custom feed.
    pub fn feed(mut self, feed: Arc<dyn MarketFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Open the store and assemble the pipeline.
    ///
    /// A store that cannot be opened or migrated aborts startup with
    /// `StorageInit`; nothing else does.
    pub fn build(self) -> Result<Bitforcast> {
        let store = Arc::new(if self.in_memory {
            PriceStore::open_in_memory()?
        } else {
            let path = self.db_path.unwrap_or_else(config::default_db_path);
            PriceStore::open(path)?
        });

        let (feed, cmc): (Arc<dyn MarketFeed>, Option<Arc<CmcMarketFeed>>) = match self.feed {
            Some(feed) => (feed, None),
            None => {
                let cmc = Arc::new(CmcMarketFeed::new(
                    self.source,
                    self.poller.http_timeout,
                )?);
                (cmc.clone(), Some(cmc))
            }
        };

        let limiter = RateLimiter::new(self.poller.min_fetch_interval);
        let poller = Arc::new(Poller::new(Arc::clone(&store), Arc::clone(&feed), limiter));

        Ok(Bitforcast {
            store,
            feed,
            cmc,
            poller,
            config: self.poller,
        })
    }
}

// ---------------------------------------------------------------------------
// Bitforcast
// ---------------------------------------------------------------------------

/// The process context object: owns the store, feed, and poller for one
/// application instance. Created at startup, torn down on drop; there is no
/// global mutable state.
pub struct Bitforcast {
    store: Arc<PriceStore>,
    feed: Arc<dyn MarketFeed>,
    cmc: Option<Arc<CmcMarketFeed>>,
    poller: Arc<Poller>,
    config: PollerConfig,
}

impl Bitforcast {
    /// Create a new builder.
    pub fn builder() -> BitforcastBuilder {
        BitforcastBuilder::default()
    }

    /// The durable sample log and its aggregate queries.
    pub fn store(&self) -> &Arc<PriceStore> {
        &self.store
    }

    /// The sampling pipeline (manual triggers, subscriptions).
    pub fn poller(&self) -> &Arc<Poller> {
        &self.poller
    }

    /// Fetch the current quote without storing it (display-only path).
    pub fn current_price(&self) -> Result<f64> {
        self.feed.latest_price()
    }

    /// Forecast the default 30-minute horizon.
    ///
    /// `bias` is a caller-supplied constant added uniformly to every
    /// forecast point.
    pub fn forecast(&self, model: ForecastModel, bias: f64) -> Result<Vec<f64>> {
        self.forecast_with_horizon(model, config::FORECAST_HORIZON, bias)
    }

    /// Forecast an explicit horizon.
    pub fn forecast_with_horizon(
        &self,
        model: ForecastModel,
        horizon: usize,
        bias: f64,
    ) -> Result<Vec<f64>> {
        let series = self.store.all(SampleOrder::Ascending)?;
        forecast::forecast_series(&series, model, horizon, bias)
    }

    /// Export the full history to a CSV spreadsheet.
    pub fn export_csv(&self, path: &Path) -> Result<ExportOutcome> {
        export::export_csv(&self.store, path)
    }

    /// Apply a new quote URL / API key.
    ///
    /// If either value actually changes, the persisted history is cleared
    /// first: stored samples are assumed invalid across source or key
    /// changes. Returns `true` when a clear happened. Asking the user to
    /// confirm is the calling adapter's job, before this call.
    pub fn update_source(&self, new: SourceConfig) -> Result<bool> {
        let Some(cmc) = &self.cmc else {
            // Custom feeds own their endpoint configuration.
            return Ok(false);
        };
        if cmc.config() == new {
            return Ok(false);
        }
        self.store.clear_all()?;
        cmc.set_config(new);
        Ok(true)
    }

    /// Start the background scheduler firing the price and dominance tasks
    /// at the configured cadence. Dropping the returned handle stops it.
    pub fn start_scheduler(&self) -> Scheduler {
        let price_poller = Arc::clone(&self.poller);
        let dominance_poller = Arc::clone(&self.poller);
        Scheduler::start(vec![
            Task::new("price-fetch", self.config.cadence, move || {
                price_poller.poll_price();
            }),
            Task::new("dominance-fetch", self.config.cadence, move || {
                dominance_poller.poll_dominance();
            }),
        ])
    }
}

impl fmt::Display for Bitforcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let samples = self.store.count().unwrap_or(0);
        write!(
            f,
            "Bitforcast(samples={}, cadence={:?})",
            samples, self.config.cadence
        )
    }
}
