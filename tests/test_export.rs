//! CSV export tests.

mod common;

use bitforcast::{export_csv, ExportOutcome, PriceStore};

#[test]
fn empty_store_exports_nothing_and_writes_no_file() {
    let store = PriceStore::open_in_memory().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prices.csv");

    let outcome = export_csv(&store, &path).unwrap();

    assert_eq!(outcome, ExportOutcome::Empty);
    assert!(!path.exists());
}

#[test]
fn export_writes_header_and_all_rows_in_id_order() {
    let store = common::seed_store(&[100.0, 150.0, 125.0]);
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prices.csv");

    let outcome = export_csv(&store, &path).unwrap();
    assert_eq!(outcome, ExportOutcome::Written(3));

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "id,timestamp,price,price_status");
    assert!(lines[1].starts_with("1,"));
    assert!(lines[1].contains("100.0"));
    assert!(lines[1].ends_with("Unchanged"));
    assert!(lines[2].contains("Higher"));
    assert!(lines[3].contains("Lower"));
}

#[test]
fn export_overwrites_a_previous_export() {
    let store = common::seed_store(&[100.0]);
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("prices.csv");

    export_csv(&store, &path).unwrap();
    store.append(&common::minute_ts(1), 110.0, bitforcast::PriceStatus::Higher).unwrap();
    let outcome = export_csv(&store, &path).unwrap();

    assert_eq!(outcome, ExportOutcome::Written(2));
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
}
