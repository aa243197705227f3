//! TLC Ingest - trip data ingestion tool

use anyhow::Result;
use clap::Parser;
use std::str::FromStr;
use tlc_common::logging::{init_logging, LogConfig, LogLevel};
use tlc_ingest::{Destination, IngestConfig, IngestPipeline, Period, TaxiColor};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tlc-ingest")]
#[command(author, version, about = "NYC TLC trip data ingestion tool")]
struct Cli {
    /// Save to postgres or as parquet files
    #[arg(long, value_enum, default_value = "postgres")]
    destination: DestinationKind,

    /// Color of the taxi
    #[arg(long, value_enum, default_value = "yellow")]
    color: TaxiColor,

    /// Year and month for data to load (YYYY-MM)
    #[arg(long, default_value = "2020-01", value_parser = Period::from_str)]
    period: Period,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Destination kind selected on the command line
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DestinationKind {
    Postgres,
    Parquet,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on verbose flag; environment overrides apply
    // in normal mode.
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .log_file_prefix("tlc-ingest".to_string())
            .build()
    } else {
        LogConfig::from_env().unwrap_or_else(|_| {
            LogConfig::builder()
                .log_file_prefix("tlc-ingest".to_string())
                .build()
        })
    };
    init_logging(&log_config)?;

    let config = IngestConfig::from_env();
    let destination = match cli.destination {
        DestinationKind::Postgres => Destination::warehouse_from_env(),
        DestinationKind::Parquet => Destination::file_tree_from_env(),
    };

    info!(
        color = %cli.color,
        period = %cli.period,
        "Ingesting trip data"
    );

    let pipeline = IngestPipeline::new(config, destination);
    let summary = pipeline.run(cli.color, &cli.period).await?;

    println!(
        "Load summary for {} taxi, period {}:",
        cli.color, cli.period
    );
    println!("{}", summary);

    Ok(())
}
