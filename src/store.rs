//! Durable append-only price log backed by DuckDB.
//!
//! One table, one connection, one mutex. Every write is a single atomic
//! statement, so readers never observe a half-committed row.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use duckdb::{params, Connection};

use crate::error::{BitforcastError, Result};
use crate::models::{PriceSample, PriceStatus};

const SCHEMA_SQL: &str = "\
    CREATE SEQUENCE IF NOT EXISTS bitcoin_price_ids START WITH 1; \
    CREATE TABLE IF NOT EXISTS bitcoin_prices ( \
        id BIGINT PRIMARY KEY DEFAULT nextval('bitcoin_price_ids'), \
        timestamp TEXT NOT NULL, \
        price DOUBLE NOT NULL, \
        price_status TEXT NOT NULL \
    )";

/// Ordering for [`PriceStore::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    Ascending,
    Descending,
}

/// Exclusive owner of the durable sample log.
///
/// All other components hold only transient query results; the only mutation
/// besides appending is [`clear_all`](Self::clear_all).
#[derive(Debug)]
pub struct PriceStore {
    conn: Mutex<Connection>,
}

impl PriceStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// Idempotent: reopening an existing database is safe. Any failure,
    /// parent directory creation included, is a `StorageInit` error, the one
    /// condition that should abort startup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(storage_init)?;
        }
        let conn = Connection::open(path).map_err(storage_init)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory store (used by tests and demos).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_init)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(storage_init)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one immutable sample and return its assigned id.
    pub fn append(&self, timestamp: &str, price: f64, status: PriceStatus) -> Result<i64> {
        let conn = self.lock_conn();
        let id = conn
            .query_row(
                "INSERT INTO bitcoin_prices (timestamp, price, price_status) \
                 VALUES (?, ?, ?) RETURNING id",
                params![timestamp, price, status.as_str()],
                |row| row.get(0),
            )
            .map_err(BitforcastError::StorageWrite)?;
        Ok(id)
    }

    /// The most recently inserted sample by id, or `None` if empty.
    pub fn latest(&self) -> Result<Option<PriceSample>> {
        let conn = self.lock_conn();
        match conn.query_row(
            "SELECT id, timestamp, price, price_status FROM bitcoin_prices \
             ORDER BY id DESC LIMIT 1",
            [],
            map_sample_row,
        ) {
            Ok(raw) => into_sample(raw).map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Full history in the requested id order.
    pub fn all(&self, order: SampleOrder) -> Result<Vec<PriceSample>> {
        let dir = match order {
            SampleOrder::Ascending => "ASC",
            SampleOrder::Descending => "DESC",
        };
        let conn = self.lock_conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, timestamp, price, price_status FROM bitcoin_prices ORDER BY id {dir}"
        ))?;
        let rows = stmt
            .query_map([], map_sample_row)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        rows.into_iter().map(into_sample).collect()
    }

    /// Arithmetic mean of all stored prices, rounded to 2 decimal places.
    ///
    /// Returns `0.0` for an empty store; a documented zero value, not an
    /// error.
    pub fn average(&self) -> Result<f64> {
        let conn = self.lock_conn();
        let avg: Option<f64> = conn.query_row(
            "SELECT ROUND(AVG(price), 2) FROM bitcoin_prices",
            [],
            |row| row.get(0),
        )?;
        Ok(avg.unwrap_or(0.0))
    }

    /// Sample counts per status. Every status key is present; statuses with
    /// no samples count 0.
    pub fn counts_by_status(&self) -> Result<HashMap<PriceStatus, u64>> {
        let mut counts: HashMap<PriceStatus, u64> =
            PriceStatus::ALL.iter().map(|s| (*s, 0)).collect();

        let conn = self.lock_conn();
        let mut stmt = conn.prepare(
            "SELECT price_status, COUNT(*) FROM bitcoin_prices GROUP BY price_status",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        for (status, count) in rows {
            let status: PriceStatus = status.parse().map_err(BitforcastError::Parse)?;
            counts.insert(status, count.max(0) as u64);
        }
        Ok(counts)
    }

    /// Number of stored samples.
    pub fn count(&self) -> Result<u64> {
        let conn = self.lock_conn();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM bitcoin_prices", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Delete every stored sample.
    ///
    /// Destructive and unconfirmed here: obtaining the user's confirmation is
    /// the calling adapter's job.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute("DELETE FROM bitcoin_prices", [])
            .map_err(BitforcastError::StorageWrite)?;
        Ok(())
    }

    /// Run `f` against the underlying connection. Crate-internal escape hatch
    /// for SQL-level features such as CSV export.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock_conn();
        f(&conn)
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn storage_init(e: impl std::error::Error + Send + Sync + 'static) -> BitforcastError {
    BitforcastError::StorageInit(Box::new(e))
}

type RawSample = (i64, String, f64, String);

fn map_sample_row(row: &duckdb::Row<'_>) -> duckdb::Result<RawSample> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_sample((id, timestamp, price, status): RawSample) -> Result<PriceSample> {
    let status: PriceStatus = status.parse().map_err(BitforcastError::Parse)?;
    Ok(PriceSample {
        id,
        timestamp,
        price,
        status,
    })
}
