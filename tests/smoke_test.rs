//! End-to-end smoke test: build the SDK, poll, aggregate, forecast, export.

mod common;

use std::sync::Arc;
use std::time::Duration;

use bitforcast::{
    Bitforcast, ExportOutcome, ForecastModel, PollOutcome, PollerConfig, PriceStatus, SampleOrder,
    SourceConfig,
};
use common::ScriptedFeed;

fn fast_polling() -> PollerConfig {
    PollerConfig {
        min_fetch_interval: Duration::ZERO,
        ..PollerConfig::default()
    }
}

#[test]
fn full_pipeline_in_memory() {
    let feed = ScriptedFeed::with_prices(&[
        100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 170.0,
    ]);
    let app = Bitforcast::builder()
        .in_memory()
        .feed(Arc::new(feed))
        .poller_config(fast_polling())
        .build()
        .unwrap();

    for _ in 0..8 {
        assert!(matches!(app.poller().poll_price(), PollOutcome::Completed(_)));
    }

    // Store and aggregates.
    let store = app.store();
    assert_eq!(store.count().unwrap(), 8);
    assert_eq!(store.average().unwrap(), 135.0);
    let counts = store.counts_by_status().unwrap();
    assert_eq!(counts[&PriceStatus::Higher], 7);
    assert_eq!(counts[&PriceStatus::Unchanged], 1);

    let series = store.all(SampleOrder::Ascending).unwrap();
    assert_eq!(series.len(), 8);
    assert!(series.windows(2).all(|w| w[0].id < w[1].id));

    // Export round-trip.
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("history.csv");
    assert_eq!(app.export_csv(&path).unwrap(), ExportOutcome::Written(8));
    assert!(path.exists());

    // Display surface.
    assert!(app.to_string().contains("samples=8"));
}

#[test]
fn forecast_reads_the_store_directly() {
    let app = Bitforcast::builder()
        .in_memory()
        .feed(Arc::new(ScriptedFeed::new()))
        .build()
        .unwrap();

    // Seed a clean minute-spaced series through the store itself.
    for i in 0..10u32 {
        let price = 100.0 + i as f64;
        let status = if i == 0 {
            PriceStatus::Unchanged
        } else {
            PriceStatus::Higher
        };
        app.store()
            .append(&common::minute_ts(i), price, status)
            .unwrap();
    }

    let points = app.forecast(ForecastModel::LinearTrend, 0.0).unwrap();
    assert_eq!(points.len(), 30);
    assert!((points[0] - 110.0).abs() < 1e-6);

    let biased = app
        .forecast_with_horizon(ForecastModel::Arima, 10, 3.0)
        .unwrap();
    assert_eq!(biased.len(), 10);
    assert!(biased.iter().all(|p| p.is_finite()));
}

#[test]
fn update_source_clears_history_only_on_real_change() {
    let tmp = tempfile::tempdir().unwrap();
    let app = Bitforcast::builder()
        .db_path(tmp.path().join("prices.db"))
        .api_key("original-key")
        .build()
        .unwrap();

    app.store()
        .append(&common::minute_ts(0), 100.0, PriceStatus::Unchanged)
        .unwrap();

    // Same configuration: nothing happens.
    let unchanged = SourceConfig::new(bitforcast::config::QUOTE_URL, "original-key");
    assert!(!app.update_source(unchanged).unwrap());
    assert_eq!(app.store().count().unwrap(), 1);

    // New key: stored history is invalid and gets cleared.
    let changed = SourceConfig::new(bitforcast::config::QUOTE_URL, "rotated-key");
    assert!(app.update_source(changed).unwrap());
    assert_eq!(app.store().count().unwrap(), 0);
}

#[test]
fn custom_feed_ignores_update_source() {
    let app = Bitforcast::builder()
        .in_memory()
        .feed(Arc::new(ScriptedFeed::new()))
        .build()
        .unwrap();

    app.store()
        .append(&common::minute_ts(0), 100.0, PriceStatus::Unchanged)
        .unwrap();

    let cfg = SourceConfig::new("https://example.invalid/quotes", "whatever");
    assert!(!app.update_source(cfg).unwrap());
    assert_eq!(app.store().count().unwrap(), 1);
}

#[test]
fn satoshi_price_helper_rounds_to_eight_decimals() {
    let store = common::seed_store(&[64123.45]);
    let sample = store.latest().unwrap().unwrap();
    assert!((sample.satoshi_price() - 0.00064123).abs() < 1e-9);
}
