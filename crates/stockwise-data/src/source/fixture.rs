//! Recorded OHLCV fixtures stored as JSON files

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::DataSource;
use crate::config::HistoryWindow;
use crate::error::FetchError;
use crate::market::OhlcvTable;

/// Replays bars from `<dir>/<SYMBOL>.json`
///
/// Each file holds a JSON array of bars. The window is ignored: a fixture
/// always returns everything it recorded.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a symbol is read from
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        _window: &HistoryWindow,
    ) -> Result<OhlcvTable, FetchError> {
        let path = self.path_for(symbol);
        debug!(symbol, path = %path.display(), "Loading fixture");

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Fixture(format!("cannot read {}: {e}", path.display())))?;

        serde_json::from_str(&raw)
            .map_err(|e| FetchError::Fixture(format!("cannot parse {}: {e}", path.display())))
    }
}
