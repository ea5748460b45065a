#[derive(Debug, thiserror::Error)]
pub enum BitforcastError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Parse(String),

    #[error("failed to open price store: {0}")]
    StorageInit(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write price store: {0}")]
    StorageWrite(#[source] duckdb::Error),

    #[error("price store query failed: {0}")]
    Storage(#[from] duckdb::Error),

    #[error("forecast failed: {0}")]
    Forecast(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BitforcastError>;
