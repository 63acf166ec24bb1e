//! Technical indicator enrichment
//!
//! Appends the indicator bundle (SMA 20/50/200, RSI 14, MACD 12/26/9) to an
//! OHLCV table. Every column is `None` until its warm-up window is filled,
//! and nothing is rounded here; rounding only happens in the summary.

use serde::Serialize;
use ta::{Next, indicators::SimpleMovingAverage};

use super::ohlcv::{Bar, OhlcvTable};
use crate::error::{Result, StockError};

pub const SMA_SHORT: usize = 20;
pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Rows needed before every indicator in the bundle is defined
pub const FULL_WARMUP_ROWS: usize = SMA_LONG;

/// Indicator values for one row
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorValues {
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
}

impl IndicatorValues {
    /// True once every indicator has left its warm-up window
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Names of the indicators that are still undefined
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("sma20", self.sma20),
            ("sma50", self.sma50),
            ("sma200", self.sma200),
            ("rsi14", self.rsi14),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_none().then_some(name))
        .collect()
    }

    /// Apply `f` to every defined value
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            sma20: self.sma20.map(&f),
            sma50: self.sma50.map(&f),
            sma200: self.sma200.map(&f),
            rsi14: self.rsi14.map(&f),
            macd: self.macd.map(&f),
            macd_signal: self.macd_signal.map(&f),
        }
    }
}

/// An OHLCV bar with its indicator columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
}

/// OHLCV table with the indicator bundle appended
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedTable {
    rows: Vec<EnrichedRow>,
}

impl EnrichedTable {
    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&EnrichedRow> {
        self.rows.last()
    }

    pub fn previous(&self) -> Option<&EnrichedRow> {
        self.rows.len().checked_sub(2).map(|i| &self.rows[i])
    }
}

/// Compute the indicator bundle for `table`
///
/// The input is only borrowed; the returned table owns copies of the bars.
pub fn compute_indicators(table: &OhlcvTable) -> Result<EnrichedTable> {
    let closes = table.closes();

    let sma20 = sma(&closes, SMA_SHORT)?;
    let sma50 = sma(&closes, SMA_MEDIUM)?;
    let sma200 = sma(&closes, SMA_LONG)?;
    let rsi14 = rsi(&closes, RSI_PERIOD)?;
    let (macd_line, macd_signal) = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;

    let rows = table
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| EnrichedRow {
            bar: bar.clone(),
            indicators: IndicatorValues {
                sma20: sma20[i],
                sma50: sma50[i],
                sma200: sma200[i],
                rsi14: rsi14[i],
                macd: macd_line[i],
                macd_signal: macd_signal[i],
            },
        })
        .collect();

    Ok(EnrichedTable { rows })
}

/// Simple moving average, undefined for the first `period - 1` rows
pub fn sma(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    let mut indicator = SimpleMovingAverage::new(period)
        .map_err(|e| StockError::IndicatorError(format!("SMA({period}): {e}")))?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let average = indicator.next(value);
            (i + 1 >= period).then_some(average)
        })
        .collect())
}

/// Exponential moving average seeded with the SMA of the first `period` values
///
/// Multiplier `k = 2 / (period + 1)`. Undefined for the first `period - 1` rows.
pub fn ema(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(StockError::IndicatorError(
            "EMA period must be greater than 0".to_string(),
        ));
    }

    let mut out = vec![None; values.len()];
    if values.len() < period {
        return Ok(out);
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);

    for (i, &value) in values.iter().enumerate().skip(period) {
        current = value * k + current * (1.0 - k);
        out[i] = Some(current);
    }

    Ok(out)
}

/// Relative strength index with Wilder's smoothing (factor `1/period`)
///
/// Seed averages are the plain means of the first `period` gains and losses,
/// so the first value lands on row `period`.
pub fn rsi(values: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(StockError::IndicatorError(
            "RSI period must be greater than 0".to_string(),
        ));
    }

    let mut out = vec![None; values.len()];
    if values.len() <= period {
        return Ok(out);
    }

    let n = period as f64;
    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / n;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / n;
    out[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for (i, &change) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (n - 1.0) + change.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-change).max(0.0)) / n;
        // changes[i] ends at row i + 1
        out[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    Ok(out)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        // flat series is neutral
        if avg_gain <= 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD line (`EMA(fast) - EMA(slow)`) and its `signal`-period EMA
///
/// The signal EMA starts at the first defined MACD value, so it is undefined
/// for the first `slow + signal - 2` rows.
pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>)> {
    if fast >= slow {
        return Err(StockError::IndicatorError(format!(
            "MACD fast period ({fast}) must be shorter than slow period ({slow})"
        )));
    }

    let fast_ema = ema(values, fast)?;
    let slow_ema = ema(values, slow)?;

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let mut signal_line = vec![None; values.len()];
    if let Some(start) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[start..].iter().flatten().copied().collect();
        for (offset, value) in ema(&defined, signal)?.into_iter().enumerate() {
            signal_line[start + offset] = value;
        }
    }

    Ok((line, signal_line))
}
