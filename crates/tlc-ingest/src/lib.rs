// NYC TLC Trip Data Ingestion
//
// Loads monthly taxi trip CSVs published as GitHub release assets into one
// of two destinations: a Postgres warehouse or a local Parquet file tree.
//
// The pipeline is a sequential fan-out over discovered assets:
// - Discover: list release assets, keep URLs matching the requested period
// - Resolve: derive each asset's resource name and bucket path
// - Load: fetch, decode CSV, and append to the destination table
//
// Loads are append-only and fail-fast: the first failed asset aborts the
// remainder of the run, and nothing at the destination is updated or
// deleted. Re-running a period accumulates rows; callers scope their period
// filters to avoid reprocessing.

pub mod asset;
pub mod config;
pub mod discovery;
pub mod download;
pub mod pipeline;
pub mod schema;
pub mod sink;

// Re-export main types
pub use asset::{CsvSource, DiscoveredAsset};
pub use config::{IngestConfig, Period, TaxiColor};
pub use discovery::AssetDiscovery;
pub use download::AssetFetcher;
pub use pipeline::IngestPipeline;
pub use schema::{ColumnType, CsvTable};
pub use sink::{Destination, Sink};

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for the ingestion pipeline
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no data found for {color} taxi for period {period}")]
    NoAssets { color: String, period: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status} fetching {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV decode error: {0}")]
    Csv(#[from] csv::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("configuration error: {0}")]
    Config(String),
}
