//! Yahoo Finance market data source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

use super::{DataSource, table_from_provider_rows};
use crate::config::HistoryWindow;
use crate::error::FetchError;
use crate::market::{Bar, OhlcvTable};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Requests per minute when no explicit limit is given
pub const DEFAULT_RATE_LIMIT: u32 = 60;

/// Live provider backed by the Yahoo Finance chart API
pub struct YahooSource {
    connector: yahoo::YahooConnector,
    rate_limiter: SharedRateLimiter,
}

impl YahooSource {
    /// Create a source with the default rate limit
    pub fn new() -> Result<Self, FetchError> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Create a source allowing `per_minute` requests per minute
    pub fn with_rate_limit(per_minute: u32) -> Result<Self, FetchError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| FetchError::Provider(e.to_string()))?;
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            connector,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

fn to_offset(at: DateTime<Utc>) -> Result<OffsetDateTime, FetchError> {
    OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| FetchError::Provider(format!("Invalid timestamp {at}: {e}")))
}

#[async_trait]
impl DataSource for YahooSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        window: &HistoryWindow,
    ) -> Result<OhlcvTable, FetchError> {
        self.rate_limiter.until_ready().await;

        let end = Utc::now();
        let start = end - window.period;
        debug!(symbol, %start, %end, interval = %window.interval, "Requesting Yahoo history");

        let response = self
            .connector
            .get_quote_history_interval(
                symbol,
                to_offset(start)?,
                to_offset(end)?,
                window.interval.as_str(),
            )
            .await
            .map_err(|e| FetchError::Provider(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| FetchError::Provider(e.to_string()))?;

        let rows = quotes.iter().filter_map(|q| {
            Some(Bar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)?,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
        });

        table_from_provider_rows(symbol, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interval;

    #[test]
    fn test_to_offset_keeps_seconds() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(to_offset(at).unwrap().unix_timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_daily_history() {
        let source = YahooSource::new().unwrap();
        let window = HistoryWindow {
            period: chrono::Duration::days(30),
            interval: Interval::OneDay,
        };

        let table = source.fetch_ohlcv("AAPL", &window).await.unwrap();
        assert!(!table.is_empty());
        assert!(table.latest().unwrap().close > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_unknown_symbol_fails() {
        let source = YahooSource::new().unwrap();
        let result = source
            .fetch_ohlcv("INVALID_SYMBOL_12345", &HistoryWindow::default())
            .await;
        assert!(result.is_err() || result.unwrap().is_empty());
    }
}
