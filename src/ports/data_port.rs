//! Data access port trait.

use crate::domain::bar::Series;
use crate::domain::error::BacktestError;

/// Source of indicator-annotated series, one per ticker.
pub trait DataPort {
    /// Tickers available from this source, in a stable order.
    fn list_tickers(&self) -> Result<Vec<String>, BacktestError>;

    /// Loads and sorts the full series for `ticker`.
    fn load_series(&self, ticker: &str) -> Result<Series, BacktestError>;
}
