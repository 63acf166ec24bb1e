//! Builds a market snapshot for every configured ticker

use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::summary::{Snapshot, TickerSummary};
use crate::config::{StockConfig, TickerFile, normalize_tickers};
use crate::error::{FetchError, Result, StockError};
use crate::market::{OhlcvTable, compute_indicators};
use crate::source::DataSource;

/// Fetches, enriches and summarises each configured ticker
///
/// The ticker list is read once in [`MarketSnapshotBuilder::new`] and never
/// changes afterwards. A failure on any ticker aborts the whole run.
pub struct MarketSnapshotBuilder {
    config: StockConfig,
    tickers: Vec<String>,
    source: Arc<dyn DataSource>,
}

impl MarketSnapshotBuilder {
    /// Create a builder, loading tickers from `config.ticker_file`
    pub fn new(config: StockConfig, source: Arc<dyn DataSource>) -> Result<Self> {
        let tickers = TickerFile::load(&config.ticker_file)?.tickers()?;
        info!(
            file = %config.ticker_file.display(),
            tickers = tickers.len(),
            source = source.name(),
            "Loaded ticker configuration"
        );
        Self::with_tickers(config, tickers, source)
    }

    /// Create a builder for an explicit ticker list
    ///
    /// The list is cleaned the same way as one read from a file.
    pub fn with_tickers<I, S>(
        config: StockConfig,
        tickers: I,
        source: Arc<dyn DataSource>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;
        let tickers = normalize_tickers(tickers)?;
        if let Some(dir) = &config.cache_dir {
            debug!(cache_dir = %dir.display(), "Cache directory configured but unused");
        }

        Ok(Self {
            config,
            tickers,
            source,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Summarise every ticker, keyed in configured order
    ///
    /// With the default `max_concurrency` of 1 tickers are processed one after
    /// another. Higher limits overlap fetches but keep the output order.
    pub async fn build_snapshot(&self) -> Result<Snapshot> {
        info!(
            tickers = self.tickers.len(),
            period_days = self.config.window.period.num_days(),
            interval = %self.config.window.interval,
            "Building market snapshot"
        );

        let summaries: Vec<TickerSummary> = stream::iter(&self.tickers)
            .map(|symbol| self.summarize(symbol))
            .buffered(self.config.max_concurrency)
            .try_collect()
            .await?;

        Ok(summaries.into_iter().collect())
    }

    /// Fetch, enrich and summarise a single ticker
    pub async fn summarize(&self, symbol: &str) -> Result<TickerSummary> {
        let table = self.fetch(symbol).await.map_err(|e| {
            error!(symbol, source = self.source.name(), error = %e, "Failed to fetch data");
            StockError::data_source(symbol, e)
        })?;
        info!(symbol, rows = table.len(), "Fetched OHLCV data");

        let enriched = compute_indicators(&table)?;
        let summary = TickerSummary::from_table(symbol, enriched)
            .ok_or_else(|| StockError::data_source(symbol, FetchError::Empty))?;

        let missing = summary.indicators.missing();
        if !missing.is_empty() {
            warn!(
                symbol,
                rows = summary.rows(),
                ?missing,
                "Not enough history for every indicator"
            );
        }

        Ok(summary)
    }

    async fn fetch(&self, symbol: &str) -> std::result::Result<OhlcvTable, FetchError> {
        let request = self.source.fetch_ohlcv(symbol, &self.config.window);
        let table = tokio::time::timeout(self.config.fetch_timeout, request)
            .await
            .map_err(|_| FetchError::Timeout(self.config.fetch_timeout))??;

        if table.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HistoryWindow, Interval};
    use crate::market::ohlcv::tests::table_from_closes;
    use crate::source::{FixtureSource, MockDataSource, SyntheticSource};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::{always, eq};
    use std::io::Write;
    use std::time::Duration;

    fn config() -> StockConfig {
        StockConfig::builder()
            .fetch_timeout(Duration::from_millis(200))
            .build()
            .unwrap()
    }

    fn builder(tickers: &[&str], source: impl DataSource + 'static) -> MarketSnapshotBuilder {
        MarketSnapshotBuilder::with_tickers(
            config(),
            tickers.iter().copied(),
            Arc::new(source),
        )
        .unwrap()
    }

    fn synthetic_fixed() -> SyntheticSource {
        SyntheticSource::fixed().ending_at(Utc.with_ymd_and_hms(2024, 6, 7, 16, 0, 0).unwrap())
    }

    struct SlowSource;

    #[async_trait]
    impl DataSource for SlowSource {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn fetch_ohlcv(
            &self,
            symbol: &str,
            window: &HistoryWindow,
        ) -> std::result::Result<OhlcvTable, FetchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            SyntheticSource::fixed().fetch_ohlcv(symbol, window).await
        }
    }

    #[tokio::test]
    async fn test_fixed_source_summary() {
        let snapshot = builder(&["NVDA"], synthetic_fixed()).build_snapshot().await.unwrap();

        let nvda = snapshot.get("NVDA").unwrap();
        assert_eq!(nvda.latest_price, 364.0);
        assert_eq!(nvda.pct_change_1d, Some(0.83));
        assert_eq!(nvda.rows(), 5);
        assert_eq!(nvda.as_of, Utc.with_ymd_and_hms(2024, 6, 7, 16, 0, 0).unwrap());
        assert!(nvda.indicators.sma20.is_none());
    }

    #[tokio::test]
    async fn test_keys_follow_configured_order() {
        let tickers = ["TSLA", "AAPL", "NVDA", "AMZN"];
        let snapshot = builder(&tickers, synthetic_fixed()).build_snapshot().await.unwrap();
        assert_eq!(snapshot.symbols(), tickers.to_vec());
    }

    #[tokio::test]
    async fn test_empty_ticker_list_gives_empty_snapshot() {
        let mut source = MockDataSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch_ohlcv().never();

        let snapshot = builder(&[], source).build_snapshot().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_aborts_snapshot() {
        stockwise_utils::init_tracing_with("debug");

        let mut source = MockDataSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_ohlcv()
            .with(eq("BAD"), always())
            .times(1)
            .returning(|_, _| Err(FetchError::Provider("HTTP 404".to_string())));
        source
            .expect_fetch_ohlcv()
            .with(eq("GOOD"), always())
            .returning(|_, _| Ok(table_from_closes(&[352.0, 357.0, 354.0, 361.0, 364.0])));

        let err = builder(&["GOOD", "BAD", "GOOD2"], source)
            .build_snapshot()
            .await
            .unwrap_err();

        match err {
            StockError::DataSource { symbol, source } => {
                assert_eq!(symbol, "BAD");
                assert!(matches!(source, FetchError::Provider(msg) if msg == "HTTP 404"));
            }
            other => panic!("Expected DataSource error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_table_is_data_source_error() {
        let source = SyntheticSource::wave(0);
        let err = builder(&["EMPTY"], source).build_snapshot().await.unwrap_err();

        assert_eq!(err.symbol(), Some("EMPTY"));
        assert!(matches!(err, StockError::DataSource { source: FetchError::Empty, .. }));
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let err = builder(&["SLOW"], SlowSource).build_snapshot().await.unwrap_err();

        assert!(matches!(
            err,
            StockError::DataSource { source: FetchError::Timeout(d), .. } if d == Duration::from_millis(200)
        ));
    }

    #[tokio::test]
    async fn test_long_history_fills_every_indicator() {
        let snapshot = builder(&["SPY", "QQQ"], SyntheticSource::wave(300))
            .build_snapshot()
            .await
            .unwrap();

        for summary in &snapshot {
            assert!(summary.indicators.is_complete(), "{}: {:?}", summary.symbol, summary.indicators);
            assert_eq!(summary.rows(), 300);
        }
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_order() {
        let config = StockConfig::builder().max_concurrency(3).build().unwrap();
        let tickers: Vec<String> = ["E", "D", "C", "B", "A"].iter().map(ToString::to_string).collect();
        let builder =
            MarketSnapshotBuilder::with_tickers(config, tickers.clone(), Arc::new(synthetic_fixed()))
                .unwrap();

        let snapshot = builder.build_snapshot().await.unwrap();
        assert_eq!(snapshot.symbols(), tickers.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_new_reads_ticker_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tickers: [NVDA, ' msft ']\ninterval: 1d").unwrap();

        let config = StockConfig::from_file(file.path()).unwrap();
        assert_eq!(config.window.interval, Interval::OneDay);

        let builder = MarketSnapshotBuilder::new(config, Arc::new(synthetic_fixed())).unwrap();
        assert_eq!(builder.tickers(), ["NVDA".to_string(), "msft".to_string()]);
    }

    #[tokio::test]
    async fn test_new_without_tickers_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "report:\n  format: markdown").unwrap();

        let config = StockConfig::builder().ticker_file(file.path()).build().unwrap();
        let builder = MarketSnapshotBuilder::new(config, Arc::new(synthetic_fixed())).unwrap();

        assert!(builder.tickers().is_empty());
        assert!(builder.build_snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_list_is_cleaned() {
        let mut source = MockDataSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_ohlcv()
            .with(eq("NVDA"), always())
            .times(1)
            .returning(|_, _| Ok(table_from_closes(&[352.0, 357.0, 354.0, 361.0, 364.0])));
        source
            .expect_fetch_ohlcv()
            .with(eq("aapl"), always())
            .times(1)
            .returning(|_, _| Ok(table_from_closes(&[190.0, 191.5])));

        let builder = builder(&[" NVDA", "aapl", "NVDA "], source);
        assert_eq!(builder.tickers(), ["NVDA".to_string(), "aapl".to_string()]);

        let snapshot = builder.build_snapshot().await.unwrap();
        assert_eq!(snapshot.symbols(), vec!["NVDA", "aapl"]);
        assert_eq!(snapshot.get("NVDA").unwrap().latest_price, 364.0);
    }

    #[test]
    fn test_blank_explicit_ticker_rejected() {
        let result =
            MarketSnapshotBuilder::with_tickers(config(), ["AAPL", " "], Arc::new(synthetic_fixed()));
        assert!(matches!(result, Err(StockError::ConfigError(msg)) if msg.contains("#2")));
    }

    #[test]
    fn test_new_with_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = StockConfig::builder()
            .ticker_file(dir.path().join("config.yaml"))
            .build()
            .unwrap();

        let result = MarketSnapshotBuilder::new(config, Arc::new(synthetic_fixed()));
        assert!(matches!(result, Err(StockError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_fixture_source_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let table = synthetic_fixed()
            .fetch_ohlcv("AAPL", &HistoryWindow::default())
            .await
            .unwrap();
        std::fs::write(dir.path().join("AAPL.json"), serde_json::to_string(&table).unwrap()).unwrap();

        let snapshot = builder(&["AAPL"], FixtureSource::new(dir.path()))
            .build_snapshot()
            .await
            .unwrap();

        assert_eq!(snapshot.get("AAPL").unwrap().latest_price, 364.0);
        assert_eq!(snapshot.get("AAPL").unwrap().table.len(), table.len());
    }

    #[tokio::test]
    async fn test_missing_fixture_names_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(&["MISSING"], FixtureSource::new(dir.path()))
            .build_snapshot()
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Data source error for MISSING: fixture error"));
    }
}
