//! OHLCV tables and the indicators derived from them

pub mod indicators;
pub mod ohlcv;

pub use indicators::{EnrichedRow, EnrichedTable, IndicatorValues, compute_indicators};
pub use ohlcv::{Bar, OhlcvTable};
