//! Command-line entry point for stockwise
//!
//! Loads the shared configuration, builds a market snapshot for every
//! configured ticker and prints it.
//!
//! # Usage
//!
//! ```bash
//! # Live data for the tickers in ./config.yaml
//! cargo run --bin stockwise
//!
//! # Offline run against recorded fixtures, JSON output
//! cargo run --bin stockwise -- --source fixture --fixture-dir fixtures --format json
//! ```

mod report;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use stockwise_data::source::{FixtureSource, SyntheticSource, YahooSource};
use stockwise_data::{DataSource, MarketSnapshotBuilder, StockConfig};
use tracing::info;

/// Rows generated by the synthetic source when warm-up is wanted
const SYNTHETIC_ROWS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Yahoo Finance
    Yahoo,
    /// Generated data, no network access
    Synthetic,
    /// Recorded JSON fixtures
    Fixture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "stockwise")]
#[command(about = "Market snapshot with technical indicators per ticker", long_about = None)]
struct Args {
    /// Configuration file holding the `tickers` list
    #[arg(short, long, default_value = stockwise_data::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Where market data comes from
    #[arg(short, long, value_enum, default_value_t = SourceKind::Yahoo)]
    source: SourceKind,

    /// Directory of `<SYMBOL>.json` files for the fixture source
    #[arg(long, required_if_eq("source", "fixture"))]
    fixture_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Include the full enriched table in JSON output
    #[arg(long)]
    with_table: bool,
}

impl Args {
    /// Reject flag combinations clap cannot express
    fn check(&self) -> Result<(), clap::Error> {
        if self.with_table && self.format != OutputFormat::Json {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--with-table only applies to --format json",
            ));
        }
        Ok(())
    }
}

fn data_source(args: &Args) -> anyhow::Result<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match args.source {
        SourceKind::Yahoo => Arc::new(YahooSource::new()?),
        SourceKind::Synthetic => Arc::new(SyntheticSource::wave(SYNTHETIC_ROWS)),
        SourceKind::Fixture => {
            let dir = args
                .fixture_dir
                .clone()
                .context("--fixture-dir is required with --source fixture")?;
            Arc::new(FixtureSource::new(dir))
        }
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    stockwise_utils::init_tracing();

    let args = Args::parse();
    if let Err(e) = args.check() {
        e.exit();
    }
    info!(config = %args.config.display(), source = ?args.source, "Starting stockwise");

    let config = StockConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let builder = MarketSnapshotBuilder::new(config, data_source(&args)?)?;

    let snapshot = builder.build_snapshot().await?;
    info!(tickers = snapshot.len(), "Snapshot complete");

    match args.format {
        OutputFormat::Table => println!("{}", report::render_table(&snapshot)),
        OutputFormat::Json => {
            let json = snapshot.to_json(args.with_table)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["stockwise"]);
        assert_eq!(args.config, PathBuf::from("config.yaml"));
        assert_eq!(args.source, SourceKind::Yahoo);
        assert_eq!(args.format, OutputFormat::Table);
        assert!(!args.with_table);
    }

    #[test]
    fn test_fixture_requires_dir() {
        let result = Args::try_parse_from(["stockwise", "--source", "fixture"]);
        assert!(result.is_err());

        let args =
            Args::try_parse_from(["stockwise", "--source", "fixture", "--fixture-dir", "data"])
                .unwrap();
        assert_eq!(args.fixture_dir, Some(PathBuf::from("data")));
        assert!(data_source(&args).is_ok());
    }

    #[test]
    fn test_with_table_needs_json() {
        let args = Args::parse_from(["stockwise", "--with-table"]);
        let err = args.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let args = Args::parse_from(["stockwise", "--format", "json", "--with-table"]);
        assert!(args.check().is_ok());
        assert!(Args::parse_from(["stockwise"]).check().is_ok());
    }

    #[test]
    fn test_synthetic_source_selected() {
        let args = Args::parse_from(["stockwise", "--source", "synthetic", "--format", "json"]);
        assert_eq!(data_source(&args).unwrap().name(), "synthetic");
        assert_eq!(args.format, OutputFormat::Json);
    }
}
