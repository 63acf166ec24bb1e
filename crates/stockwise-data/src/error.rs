//! Error types for market data operations

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a market snapshot
#[derive(Debug, Error)]
pub enum StockError {
    /// Ticker configuration could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Fetching data for a ticker failed
    #[error("Data source error for {symbol}: {source}")]
    DataSource {
        symbol: String,
        #[source]
        source: FetchError,
    },

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl StockError {
    /// Wrap a fetch failure with the ticker it happened for
    pub fn data_source(symbol: impl Into<String>, source: FetchError) -> Self {
        Self::DataSource {
            symbol: symbol.into(),
            source,
        }
    }

    /// Ticker the error refers to, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::DataSource { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}

/// Failure reported by a [`DataSource`](crate::source::DataSource)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream provider rejected or failed the request
    #[error("provider error: {0}")]
    Provider(String),

    /// The fetch did not complete in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The provider returned no rows
    #[error("no data returned")]
    Empty,

    /// The rows returned break the OHLCV table invariants
    #[error("invalid OHLCV table: {0}")]
    InvalidTable(String),

    /// A recorded fixture could not be loaded
    #[error("fixture error: {0}")]
    Fixture(String),
}

/// Result type alias for market data operations
pub type Result<T> = std::result::Result<T, StockError>;
