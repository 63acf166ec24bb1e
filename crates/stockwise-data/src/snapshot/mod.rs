//! Per-ticker summaries and the builder that produces them

pub mod builder;
pub mod summary;

pub use builder::MarketSnapshotBuilder;
pub use summary::{Snapshot, TickerSummary, pct_change, round2};
