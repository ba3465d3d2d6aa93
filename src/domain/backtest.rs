//! Backtest pipeline: signal scan, exit simulation and capital accounting.
//!
//! Series are processed independently, optionally on the rayon pool. Each
//! series contributes its trades in scan order and the ledger is then
//! stable-sorted by entry time, so the result does not depend on the order
//! in which workers finish.

use rayon::prelude::*;

use super::bar::Series;
use super::capital::{apply_model, dedup_by_entry_date, CapitalConfig, CapitalModel, EquityPoint};
use super::error::BacktestError;
use super::exit::{resolve, ExitPolicy};
use super::metrics::{aggregate, PerformanceReport};
use super::signal::scan;
use super::trade::{Trade, TradeLedger};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestConfig {
    pub exit_policy: ExitPolicy,
    pub capital: CapitalConfig,
    pub parallel: bool,
}

/// One capital model replayed over a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub model: CapitalModel,
    pub ledger: TradeLedger,
    pub points: Vec<EquityPoint>,
    pub report: PerformanceReport,
}

impl ModelRun {
    pub fn new(model: CapitalModel, ledger: TradeLedger, capital: &CapitalConfig) -> Self {
        let points = apply_model(&ledger, model, capital);
        let report = aggregate(&points, ledger.trades());
        ModelRun {
            model,
            ledger,
            points,
            report,
        }
    }

    /// Trades paired with their equity points.
    pub fn rows(&self) -> impl Iterator<Item = (&Trade, &EquityPoint)> {
        self.ledger.iter().zip(&self.points)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub fixed: ModelRun,
    pub reinvest: ModelRun,
    /// Fixed capital, one trade per entry date.
    pub deduplicated: ModelRun,
}

/// Scans one series and resolves every signal into a trade.
pub fn trades_for_series(series: &Series, policy: &ExitPolicy) -> Vec<Trade> {
    scan(series)
        .map(|signal| resolve(series, &signal, policy))
        .collect()
}

pub fn collect_trades(series: &[Series], policy: &ExitPolicy, parallel: bool) -> TradeLedger {
    let batches: Vec<Vec<Trade>> = if parallel {
        series
            .par_iter()
            .map(|s| trades_for_series(s, policy))
            .collect()
    } else {
        series.iter().map(|s| trades_for_series(s, policy)).collect()
    };

    let mut ledger = TradeLedger::new();
    for (s, batch) in series.iter().zip(&batches) {
        tracing::debug!(ticker = %s.ticker, trades = batch.len(), "resolved signals");
    }
    ledger.extend(batches.into_iter().flatten());
    ledger
}

/// Replays `ledger` under every capital model.
pub fn evaluate(ledger: TradeLedger, capital: &CapitalConfig) -> BacktestResult {
    let deduplicated = dedup_by_entry_date(&ledger);
    BacktestResult {
        fixed: ModelRun::new(CapitalModel::Fixed, ledger.clone(), capital),
        reinvest: ModelRun::new(CapitalModel::Reinvest, ledger, capital),
        deduplicated: ModelRun::new(CapitalModel::Fixed, deduplicated, capital),
    }
}

/// Full run over loaded series. Fails with [`BacktestError::NoTrades`] when
/// no series produced a signal.
pub fn run_backtest(
    series: &[Series],
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    let ledger = collect_trades(series, &config.exit_policy, config.parallel);
    if ledger.is_empty() {
        return Err(BacktestError::NoTrades {
            series: series.len(),
        });
    }
    tracing::info!(
        trades = ledger.len(),
        series = series.len(),
        "collected trades"
    );
    Ok(evaluate(ledger, &config.capital))
}
