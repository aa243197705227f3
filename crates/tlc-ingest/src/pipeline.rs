// Pipeline orchestration
//
// Sequential fan-out over discovered assets: discover, prepare the
// destination, then fetch/decode/append one asset at a time in listing
// order. Fail-fast: the first failed load records its result, logs the
// partial summary, and aborts the remaining assets. Append order at the
// destination is exactly discovery order.

use tracing::{error, info};

use tlc_common::types::{LoadResult, RunSummary};

use crate::asset::CsvSource;
use crate::config::{IngestConfig, Period, TaxiColor};
use crate::discovery::AssetDiscovery;
use crate::download::AssetFetcher;
use crate::schema::CsvTable;
use crate::sink::{Destination, Sink};
use crate::{IngestError, Result};

/// Trip-data ingestion pipeline
pub struct IngestPipeline {
    config: IngestConfig,
    destination: Destination,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig, destination: Destination) -> Self {
        Self {
            config,
            destination,
        }
    }

    /// Run the full pipeline for one color and period.
    ///
    /// 1. Discover matching release assets
    /// 2. Prepare the destination (only once assets exist)
    /// 3. Fetch, decode, and append each asset sequentially
    pub async fn run(&self, color: TaxiColor, period: &Period) -> Result<RunSummary> {
        info!(
            color = %color,
            period = %period.as_str(),
            dataset = %self.destination.dataset_name(),
            "Starting trip-data ingestion"
        );

        // 1. Discover
        info!("Step 1/3: Discovering release assets...");
        let discovery = AssetDiscovery::new(self.config.clone())?;
        let assets = discovery.discover(color, period).await?;

        if assets.is_empty() {
            return Err(IngestError::NoAssets {
                color: color.to_string(),
                period: period.to_string(),
            });
        }
        info!("Discovered {} asset(s)", assets.len());

        // 2. Prepare destination
        info!("Step 2/3: Preparing destination...");
        let mut sink = self.destination.connect().await?;

        // 3. Load each asset in discovery order
        info!("Step 3/3: Loading assets...");
        let fetcher = AssetFetcher::new(&self.config)?;
        let table = color.table_name();
        let mut summary = RunSummary::new();

        for (index, asset) in assets.iter().enumerate() {
            info!(
                asset = %asset.resource_name,
                "Loading asset {}/{}",
                index + 1,
                assets.len()
            );

            let source = CsvSource::from_asset(asset);
            match load_asset(&fetcher, &mut sink, &table, &source).await {
                Ok(rows) => {
                    info!(asset = %asset.resource_name, rows = rows, "Asset loaded");
                    summary.record(LoadResult::success(&asset.resource_name, rows));
                },
                Err(e) => {
                    summary.record(LoadResult::failure(&asset.resource_name, e.to_string()));
                    error!(
                        asset = %asset.resource_name,
                        error = %e,
                        "Load failed, aborting run; partial summary:\n{}",
                        summary
                    );
                    return Err(e);
                },
            }
        }

        sink.close().await;

        info!(
            assets = summary.succeeded(),
            rows = summary.total_rows(),
            "Ingestion completed"
        );

        Ok(summary)
    }
}

/// Fetch one asset, decode it, and append it to the sink.
async fn load_asset(
    fetcher: &AssetFetcher,
    sink: &mut Sink,
    table: &str,
    source: &CsvSource,
) -> Result<u64> {
    let bytes = fetcher.fetch(source).await?;
    let data = CsvTable::parse(&bytes)?;
    sink.append(table, &data).await
}

// ============================================================================
// Tests
// ============================================================================
