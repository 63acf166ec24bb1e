//! Deterministic generated market data for demos and tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DataSource;
use crate::config::HistoryWindow;
use crate::error::FetchError;
use crate::market::{Bar, OhlcvTable};

const FIXED_OPEN: [f64; 5] = [350.0, 355.0, 352.0, 358.0, 360.0];
const FIXED_HIGH: [f64; 5] = [355.0, 358.0, 355.0, 362.0, 365.0];
const FIXED_LOW: [f64; 5] = [345.0, 350.0, 348.0, 355.0, 358.0];
const FIXED_CLOSE: [f64; 5] = [352.0, 357.0, 354.0, 361.0, 364.0];
const FIXED_VOLUME: [u64; 5] = [1_000_000, 1_200_000, 1_100_000, 1_300_000, 1_400_000];

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Fixed,
    Wave { rows: usize },
}

/// Generated OHLCV history, identical for every ticker
///
/// Bars are spaced by the requested interval and end at `end` (or the time
/// of the call when unset).
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pattern: Pattern,
    end: Option<DateTime<Utc>>,
}

impl SyntheticSource {
    /// Five fixed bars closing at 352, 357, 354, 361, 364
    pub fn fixed() -> Self {
        Self {
            pattern: Pattern::Fixed,
            end: None,
        }
    }

    /// `rows` bars of a drifting sine wave, long enough to warm up indicators
    pub fn wave(rows: usize) -> Self {
        Self {
            pattern: Pattern::Wave { rows },
            end: None,
        }
    }

    /// Pin the timestamp of the last bar
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    fn generate(&self, window: &HistoryWindow) -> Vec<Bar> {
        let end = self.end.unwrap_or_else(Utc::now);
        let step = window.interval.step();

        let prices: Vec<(f64, f64, f64, f64, u64)> = match self.pattern {
            Pattern::Fixed => (0..FIXED_CLOSE.len())
                .map(|i| {
                    (
                        FIXED_OPEN[i],
                        FIXED_HIGH[i],
                        FIXED_LOW[i],
                        FIXED_CLOSE[i],
                        FIXED_VOLUME[i],
                    )
                })
                .collect(),
            Pattern::Wave { rows } => (0..rows).map(wave_point).collect(),
        };

        let last = prices.len().saturating_sub(1);
        prices
            .into_iter()
            .enumerate()
            .map(|(i, (open, high, low, close, volume))| Bar {
                timestamp: end - step * (last - i) as i32,
                open,
                high,
                low,
                close,
                volume,
            })
            .collect()
    }
}

fn wave_point(i: usize) -> (f64, f64, f64, f64, u64) {
    let t = i as f64;
    let close = 100.0 + t * 0.05 + (t / 8.0).sin() * 5.0;
    let open = 100.0 + (t - 1.0) * 0.05 + ((t - 1.0) / 8.0).sin() * 5.0;
    let high = open.max(close) + 0.5;
    let low = open.min(close) - 0.5;
    let volume = 1_000_000 + (i as u64 % 10) * 10_000;
    (open, high, low, close, volume)
}

#[async_trait]
impl DataSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch_ohlcv(
        &self,
        _symbol: &str,
        window: &HistoryWindow,
    ) -> Result<OhlcvTable, FetchError> {
        OhlcvTable::new(self.generate(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interval;
    use chrono::TimeZone;

    fn daily() -> HistoryWindow {
        HistoryWindow {
            period: chrono::Duration::days(5),
            interval: Interval::OneDay,
        }
    }

    #[tokio::test]
    async fn test_fixed_rows() {
        let end = Utc.with_ymd_and_hms(2024, 6, 7, 16, 0, 0).unwrap();
        let source = SyntheticSource::fixed().ending_at(end);

        let table = source.fetch_ohlcv("NVDA", &daily()).await.unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.closes(), FIXED_CLOSE.to_vec());
        assert_eq!(table.latest().unwrap().timestamp, end);
        assert_eq!(table.bars()[0].timestamp, end - chrono::Duration::days(4));
        assert_eq!(table.bars()[4].volume, 1_400_000);
    }

    #[test]
    fn test_wave_is_deterministic_and_valid() {
        let end = Utc.with_ymd_and_hms(2024, 6, 7, 16, 0, 0).unwrap();
        let source = SyntheticSource::wave(250).ending_at(end);

        let first = tokio_test::block_on(source.fetch_ohlcv("A", &HistoryWindow::default())).unwrap();
        let second = tokio_test::block_on(source.fetch_ohlcv("B", &HistoryWindow::default())).unwrap();

        assert_eq!(first.len(), 250);
        assert_eq!(first, second);
        assert_eq!(
            first.bars()[249].timestamp - first.bars()[248].timestamp,
            chrono::Duration::hours(1)
        );
    }

    #[test]
    fn test_empty_wave() {
        let source = SyntheticSource::wave(0);
        let table = tokio_test::block_on(source.fetch_ohlcv("A", &daily())).unwrap();
        assert!(table.is_empty());
    }
}
