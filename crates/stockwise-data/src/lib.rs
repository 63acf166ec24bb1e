//! Market data agent for stockwise
//!
//! Fetches OHLCV history for each configured ticker, appends a small bundle
//! of technical indicators and hands downstream agents a compact snapshot:
//!
//! - Data sources behind one trait (Yahoo Finance, synthetic, recorded fixtures)
//! - Indicators: SMA 20/50/200, RSI 14 (Wilder), MACD 12/26/9
//! - Per-ticker summary with latest price, one-bar change and rounded indicators
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stockwise_data::{MarketSnapshotBuilder, StockConfig, source::YahooSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StockConfig::from_file("config.yaml")?;
//!     let builder = MarketSnapshotBuilder::new(config, Arc::new(YahooSource::new()?))?;
//!
//!     let snapshot = builder.build_snapshot().await?;
//!     for summary in &snapshot {
//!         println!("{}: {}", summary.symbol, summary.latest_price);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod market;
pub mod snapshot;
pub mod source;

// Re-export main types for convenience
pub use config::{HistoryWindow, Interval, StockConfig, TickerFile};
pub use error::{FetchError, Result, StockError};
pub use market::{Bar, EnrichedTable, IndicatorValues, OhlcvTable, compute_indicators};
pub use snapshot::{MarketSnapshotBuilder, Snapshot, TickerSummary};
pub use source::DataSource;
