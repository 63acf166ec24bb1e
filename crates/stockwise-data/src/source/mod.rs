//! Market data sources
//!
//! The snapshot builder only sees the [`DataSource`] trait, so the live
//! provider, the synthetic generator and recorded fixtures are
//! interchangeable.

pub mod fixture;
pub mod synthetic;
pub mod yahoo;

pub use fixture::FixtureSource;
pub use synthetic::SyntheticSource;
pub use yahoo::YahooSource;

use async_trait::async_trait;
use tracing::warn;

use crate::config::HistoryWindow;
use crate::error::FetchError;
use crate::market::{Bar, OhlcvTable};

/// Provider of OHLCV history for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Fetch bars for `symbol` covering `window`
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        window: &HistoryWindow,
    ) -> Result<OhlcvTable, FetchError>;
}

/// Build a table from raw provider rows
///
/// Rows with non-positive prices and rows that do not move time forward are
/// dropped, since providers emit both around halts and at the live edge.
pub(crate) fn table_from_provider_rows(
    symbol: &str,
    rows: impl IntoIterator<Item = Bar>,
) -> Result<OhlcvTable, FetchError> {
    let mut bars: Vec<Bar> = Vec::new();
    let mut dropped = 0usize;

    for bar in rows {
        let moves_forward = bars.last().is_none_or(|last| bar.timestamp > last.timestamp);
        if bar.has_valid_prices() && moves_forward {
            bars.push(bar);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!(symbol, dropped, kept = bars.len(), "Dropped unusable provider rows");
    }

    OhlcvTable::new(bars)
}
