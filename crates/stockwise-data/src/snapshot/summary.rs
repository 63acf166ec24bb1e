//! Per-ticker summaries and the snapshot that collects them

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::Result;
use crate::market::{EnrichedTable, IndicatorValues};

/// Round to two decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage move from `previous` to `latest`, rounded to two decimals
pub fn pct_change(latest: f64, previous: f64) -> f64 {
    round2((latest / previous - 1.0) * 100.0)
}

/// Compact view of one ticker plus its full enriched history
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TickerSummary {
    pub symbol: String,
    pub latest_price: f64,
    /// `None` when only one bar is available
    pub pct_change_1d: Option<f64>,
    /// Latest indicator values rounded to two decimals; `None` while warming up
    pub indicators: IndicatorValues,
    pub as_of: DateTime<Utc>,
    #[serde(skip)]
    pub table: EnrichedTable,
}

impl TickerSummary {
    /// Summarise an enriched table; `None` if it has no rows
    pub fn from_table(symbol: impl Into<String>, table: EnrichedTable) -> Option<Self> {
        let latest = table.latest()?;
        let pct_change_1d = table
            .previous()
            .map(|previous| pct_change(latest.bar.close, previous.bar.close));

        Some(Self {
            symbol: symbol.into(),
            latest_price: round2(latest.bar.close),
            pct_change_1d,
            indicators: latest.indicators.map(round2),
            as_of: latest.bar.timestamp,
            table,
        })
    }

    /// Number of bars behind this summary
    pub fn rows(&self) -> usize {
        self.table.len()
    }

    /// JSON form, optionally carrying the enriched table under `table`
    pub fn to_json(&self, include_table: bool) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if include_table {
            value["table"] = serde_json::to_value(&self.table)?;
        }
        Ok(value)
    }
}

/// Ticker summaries keyed by symbol, in configured order
///
/// Keys are the configured symbols as written, minus surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<TickerSummary>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a summary, replacing any existing entry for the same symbol in place
    pub fn insert(&mut self, summary: TickerSummary) {
        match self.entries.iter_mut().find(|e| e.symbol == summary.symbol) {
            Some(existing) => *existing = summary,
            None => self.entries.push(summary),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&TickerSummary> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    /// Symbols in insertion order
    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.symbol.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickerSummary> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON object keyed by symbol
    pub fn to_json(&self, include_tables: bool) -> Result<Value> {
        let mut map = serde_json::Map::new();
        for entry in &self.entries {
            map.insert(entry.symbol.clone(), entry.to_json(include_tables)?);
        }
        Ok(Value::Object(map))
    }
}

impl FromIterator<TickerSummary> for Snapshot {
    fn from_iter<I: IntoIterator<Item = TickerSummary>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for summary in iter {
            snapshot.insert(summary);
        }
        snapshot
    }
}

impl IntoIterator for Snapshot {
    type Item = TickerSummary;
    type IntoIter = std::vec::IntoIter<TickerSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a TickerSummary;
    type IntoIter = std::slice::Iter<'a, TickerSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.symbol, entry)?;
        }
        map.end()
    }
}
