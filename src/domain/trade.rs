//! Closed trades and the entry-ordered trade ledger.

use chrono::NaiveDateTime;

use super::signal::Direction;

/// A single-contract round trip. Holds price/time snapshots only, so it
/// outlives the series it was resolved from.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub ticker: String,
    pub direction: Direction,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub open_macd_diff: f64,
    pub profit: f64,
}

impl Trade {
    /// Per-contract profit recomputed from the price snapshots.
    pub fn profit_per_unit(&self) -> f64 {
        self.direction.profit(self.entry_price, self.exit_price)
    }
}

/// Trades across all tickers, kept sorted by `entry_time`.
///
/// Sorting is stable: trades sharing an entry time stay in the order they
/// were appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trades(trades: Vec<Trade>) -> Self {
        let mut ledger = TradeLedger { trades };
        ledger.sort();
        ledger
    }

    /// Appends a batch and restores entry-time order.
    pub fn extend<I: IntoIterator<Item = Trade>>(&mut self, trades: I) {
        self.trades.extend(trades);
        self.sort();
    }

    fn sort(&mut self) {
        self.trades.sort_by_key(|t| t.entry_time);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
