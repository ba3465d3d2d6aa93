//! Report output port trait.

use crate::domain::backtest::ModelRun;
use crate::domain::error::BacktestError;
use crate::domain::metrics::QuarterlySummary;
use crate::domain::trade::Trade;

/// Sink for tabular reports. `name` identifies the report, e.g. a file name.
pub trait ReportPort {
    /// One row per trade with the model's account columns.
    fn write_model_report(&self, name: &str, run: &ModelRun) -> Result<(), BacktestError>;

    fn write_quarterly(&self, name: &str, rows: &[QuarterlySummary]) -> Result<(), BacktestError>;

    /// Single-contract trades without capital columns.
    fn write_trade_list(&self, name: &str, trades: &[Trade]) -> Result<(), BacktestError>;
}
