//! On-demand spreadsheet export of the full sample table.

use std::path::Path;

use tracing::info;

use crate::error::{BitforcastError, Result};
use crate::store::PriceStore;

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// `n` rows were written to the target file.
    Written(u64),
    /// The table was empty; no file was produced. Adapters should surface
    /// this as a notice rather than handing the user an empty spreadsheet.
    Empty,
}

/// Serialize the full table to a CSV file at `path`, id order ascending.
///
/// The write is delegated to DuckDB's `COPY ... TO`, which produces the file
/// atomically from the query result.
pub fn export_csv(store: &PriceStore, path: &Path) -> Result<ExportOutcome> {
    let rows = store.count()?;
    if rows == 0 {
        return Ok(ExportOutcome::Empty);
    }

    let path_str = path.to_str().ok_or_else(|| {
        BitforcastError::Parse(format!("export path is not valid UTF-8: {}", path.display()))
    })?;
    // Forward slashes and doubled quotes keep the SQL literal valid on
    // every platform.
    let literal = path_str.replace('\\', "/").replace('\'', "''");

    store.with_conn(|conn| {
        conn.execute_batch(&format!(
            "COPY (SELECT id, timestamp, price, price_status \
                   FROM bitcoin_prices ORDER BY id ASC) \
             TO '{literal}' (HEADER, DELIMITER ',')"
        ))
        .map_err(BitforcastError::StorageWrite)?;
        Ok(())
    })?;

    info!(rows, path = %path.display(), "exported price history");
    Ok(ExportOutcome::Written(rows))
}
