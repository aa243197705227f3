//! Common types used across the TLC pipeline

use serde::{Deserialize, Serialize};

/// Outcome of loading a single discovered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Success,
    Failure,
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Success => write!(f, "success"),
            LoadStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Per-asset load report.
///
/// One is produced for every asset the pipeline attempts, in discovery
/// order. A run that aborts early still carries the results recorded up to
/// and including the failing asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResult {
    /// File name of the loaded asset (e.g., "yellow_tripdata_2020-01.csv.gz")
    pub resource_name: String,

    /// Rows appended to the destination for this asset
    pub rows_loaded: u64,

    /// Whether the load succeeded
    pub status: LoadStatus,

    /// Error description when status is Failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadResult {
    pub fn success(resource_name: impl Into<String>, rows_loaded: u64) -> Self {
        Self {
            resource_name: resource_name.into(),
            rows_loaded,
            status: LoadStatus::Success,
            error: None,
        }
    }

    pub fn failure(resource_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            rows_loaded: 0,
            status: LoadStatus::Failure,
            error: Some(error.into()),
        }
    }
}

impl std::fmt::Display for LoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            LoadStatus::Success => {
                write!(f, "{}: {} rows appended", self.resource_name, self.rows_loaded)
            },
            LoadStatus::Failure => write!(
                f,
                "{}: failed ({})",
                self.resource_name,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Ordered per-asset results for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub results: Vec<LoadResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: LoadResult) {
        self.results.push(result);
    }

    /// Total rows appended across all successful loads.
    pub fn total_rows(&self) -> u64 {
        self.results
            .iter()
            .filter(|r| r.status == LoadStatus::Success)
            .map(|r| r.rows_loaded)
            .sum()
    }

    /// Number of assets that loaded successfully.
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == LoadStatus::Success)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for result in &self.results {
            writeln!(f, "  {}", result)?;
        }
        write!(
            f,
            "{} asset(s) loaded, {} rows appended",
            self.succeeded(),
            self.total_rows()
        )
    }
}
