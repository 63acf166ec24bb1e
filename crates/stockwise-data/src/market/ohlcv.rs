//! Time-ordered OHLCV bars

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetchError;

/// One sampling period of trading activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Whether every price field is finite and strictly positive
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Bars for a single ticker, strictly increasing in time
///
/// The invariants are checked once in [`OhlcvTable::new`], so everything
/// downstream can index the rows without re-validating them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OhlcvTable {
    bars: Vec<Bar>,
}

impl OhlcvTable {
    /// Build a table, rejecting rows that break the ordering or price rules
    pub fn new(bars: Vec<Bar>) -> Result<Self, FetchError> {
        for (i, bar) in bars.iter().enumerate() {
            if !bar.has_valid_prices() {
                return Err(FetchError::InvalidTable(format!(
                    "row {i} at {} has a non-positive price",
                    bar.timestamp.to_rfc3339()
                )));
            }
        }

        if let Some(pos) = bars
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(FetchError::InvalidTable(format!(
                "timestamps not strictly increasing at row {}",
                pos + 1
            )));
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Bar immediately before the latest one
    pub fn previous(&self) -> Option<&Bar> {
        self.bars.len().checked_sub(2).map(|i| &self.bars[i])
    }

    /// Close prices in time order
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

impl<'de> Deserialize<'de> for OhlcvTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bars = Vec::<Bar>::deserialize(deserializer)?;
        Self::new(bars).map_err(serde::de::Error::custom)
    }
}
