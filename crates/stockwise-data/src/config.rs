//! Configuration for market snapshot runs

use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default location of the shared configuration file
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default historical window, in days
pub const DEFAULT_PERIOD_DAYS: u32 = 60;

/// Sampling interval accepted by market data providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "90m")]
    NinetyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl Default for Interval {
    fn default() -> Self {
        Self::OneHour
    }
}

impl Interval {
    const ALL: [Interval; 13] = [
        Self::OneMinute,
        Self::TwoMinutes,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
        Self::NinetyMinutes,
        Self::OneHour,
        Self::OneDay,
        Self::FiveDays,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
    ];

    /// Provider-facing interval code, e.g. `"1h"`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::SixtyMinutes => "60m",
            Self::NinetyMinutes => "90m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneWeek => "1wk",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
        }
    }

    /// Nominal spacing between two bars (months count as 30 days)
    pub fn step(self) -> chrono::Duration {
        match self {
            Self::OneMinute => chrono::Duration::minutes(1),
            Self::TwoMinutes => chrono::Duration::minutes(2),
            Self::FiveMinutes => chrono::Duration::minutes(5),
            Self::FifteenMinutes => chrono::Duration::minutes(15),
            Self::ThirtyMinutes => chrono::Duration::minutes(30),
            Self::SixtyMinutes | Self::OneHour => chrono::Duration::hours(1),
            Self::NinetyMinutes => chrono::Duration::minutes(90),
            Self::OneDay => chrono::Duration::days(1),
            Self::FiveDays => chrono::Duration::days(5),
            Self::OneWeek => chrono::Duration::weeks(1),
            Self::OneMonth => chrono::Duration::days(30),
            Self::ThreeMonths => chrono::Duration::days(90),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str() == wanted)
            .ok_or_else(|| StockError::ConfigError(format!("Unsupported interval: {s}")))
    }
}

/// How much history to request and at which granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub period: chrono::Duration,
    pub interval: Interval,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            period: chrono::Duration::days(i64::from(DEFAULT_PERIOD_DAYS)),
            interval: Interval::default(),
        }
    }
}

/// Configuration for a snapshot run
#[derive(Debug, Clone)]
pub struct StockConfig {
    /// YAML file holding the `tickers` list
    pub ticker_file: PathBuf,

    /// Historical window and sampling interval
    pub window: HistoryWindow,

    /// Reserved for an on-disk cache; never read or written
    pub cache_dir: Option<PathBuf>,

    /// Upper bound on a single ticker fetch
    pub fetch_timeout: Duration,

    /// Tickers fetched at once; 1 keeps the run strictly sequential
    pub max_concurrency: usize,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            ticker_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            window: HistoryWindow::default(),
            cache_dir: None,
            fetch_timeout: Duration::from_secs(30),
            max_concurrency: 1,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Build a configuration from the settings stored in a config file
    ///
    /// Keys missing from the file keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = TickerFile::load(path)?;

        let mut builder = Self::builder().ticker_file(path);
        if let Some(days) = file.period_days {
            builder = builder.period_days(days);
        }
        if let Some(interval) = file.interval {
            builder = builder.interval(interval);
        }
        if let Some(secs) = file.fetch_timeout_secs {
            builder = builder.fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(limit) = file.max_concurrency {
            builder = builder.max_concurrency(limit);
        }
        if let Some(dir) = file.cache_dir {
            builder = builder.cache_dir(dir);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window.period <= chrono::Duration::zero() {
            return Err(StockError::ConfigError(
                "history period must be positive".to_string(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "fetch_timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency == 0 {
            return Err(StockError::ConfigError(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    ticker_file: Option<PathBuf>,
    period: Option<chrono::Duration>,
    interval: Option<Interval>,
    cache_dir: Option<PathBuf>,
    fetch_timeout: Option<Duration>,
    max_concurrency: Option<usize>,
}

impl StockConfigBuilder {
    /// Set the ticker configuration file
    pub fn ticker_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ticker_file = Some(path.into());
        self
    }

    /// Set the historical window
    pub fn period(mut self, period: chrono::Duration) -> Self {
        self.period = Some(period);
        self
    }

    /// Set the historical window in days
    pub fn period_days(self, days: u32) -> Self {
        self.period(chrono::Duration::days(i64::from(days)))
    }

    /// Set the sampling interval
    pub fn interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the per-ticker fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Set how many tickers may be fetched at once
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            ticker_file: self.ticker_file.unwrap_or(defaults.ticker_file),
            window: HistoryWindow {
                period: self.period.unwrap_or(defaults.window.period),
                interval: self.interval.unwrap_or(defaults.window.interval),
            },
            cache_dir: self.cache_dir,
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            max_concurrency: self.max_concurrency.unwrap_or(defaults.max_concurrency),
        };

        config.validate()?;
        Ok(config)
    }
}

/// On-disk shape of the shared configuration file
///
/// Only the keys this crate reads are modelled; sections owned by the news
/// and report agents are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerFile {
    #[serde(default)]
    pub tickers: Option<Vec<String>>,
    #[serde(default)]
    pub period_days: Option<u32>,
    #[serde(default)]
    pub interval: Option<Interval>,
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl TickerFile {
    /// Read and parse a configuration file
    ///
    /// A missing or unreadable file is an error; a file without a `tickers`
    /// key is not.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StockError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::parse(&raw).map_err(|e| match e {
            StockError::ConfigError(msg) => {
                StockError::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse configuration from YAML text
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let parsed: Option<Self> = serde_yaml::from_str(raw)
            .map_err(|e| StockError::ConfigError(format!("invalid YAML: {e}")))?;
        Ok(parsed.unwrap_or_default())
    }

    /// Normalised ticker list in file order, see [`normalize_tickers`]
    pub fn tickers(&self) -> Result<Vec<String>> {
        normalize_tickers(self.tickers.iter().flatten())
    }
}

/// Clean up a configured ticker list
///
/// Surrounding whitespace is trimmed but case is kept, so snapshot keys read
/// exactly as configured. Blank entries are rejected and a repeated symbol
/// keeps only its first position.
pub fn normalize_tickers<I, S>(raw: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();

    for (i, entry) in raw.into_iter().enumerate() {
        let symbol = entry.as_ref().trim();
        if symbol.is_empty() {
            return Err(StockError::ConfigError(format!(
                "ticker #{} is blank",
                i + 1
            )));
        }
        if out.iter().any(|s| s == symbol) {
            warn!(%symbol, "Duplicate ticker in configuration, keeping first occurrence");
            continue;
        }
        out.push(symbol.to_string());
    }

    Ok(out)
}
