//! Rendering of a snapshot for the terminal

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use stockwise_data::Snapshot;

const HEADER: [&str; 11] = [
    "Ticker", "As of", "Rows", "Price", "1-bar %", "SMA20", "SMA50", "SMA200", "RSI14", "MACD",
    "Signal",
];

fn number(value: Option<f64>) -> Cell {
    let text = value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// One row per ticker, undefined values shown as `-`
pub fn render_table(snapshot: &Snapshot) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(HEADER);

    for summary in snapshot {
        let ind = &summary.indicators;
        table.add_row(vec![
            Cell::new(&summary.symbol),
            Cell::new(summary.as_of.format("%Y-%m-%d %H:%M UTC")),
            Cell::new(summary.rows()).set_alignment(CellAlignment::Right),
            number(Some(summary.latest_price)),
            number(summary.pct_change_1d),
            number(ind.sma20),
            number(ind.sma50),
            number(ind.sma200),
            number(ind.rsi14),
            number(ind.macd),
            number(ind.macd_signal),
        ]);
    }

    table.to_string()
}
