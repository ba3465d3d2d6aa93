//! Performance statistics over an equity curve.
//!
//! Degenerate statistics are reported through [`Statistic`] rather than
//! coerced to zero: a Sharpe ratio with no dispersion is `Undefined`, a
//! profit factor with no losing trades is `Infinite`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;

use super::capital::EquityPoint;
use super::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Value(f64),
    Undefined,
    Infinite,
}

impl Statistic {
    pub fn value(&self) -> Option<f64> {
        match self {
            Statistic::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Statistic::Undefined)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Statistic::Infinite)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Value(v) => write!(f, "{:.4}", v),
            Statistic::Undefined => f.write_str("nan"),
            Statistic::Infinite => f.write_str("inf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSummary {
    pub year: i32,
    pub num_trades: usize,
    pub total_profit: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlySummary {
    pub year: i32,
    pub quarter: u32,
    pub num_trades: usize,
    pub balance_end: f64,
    pub profit: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub num_trades: usize,
    /// Net account profit across all trades.
    pub total_profit: f64,
    pub gross_profit: f64,
    /// Absolute value of the summed losses.
    pub gross_loss: f64,
    pub final_equity: Option<f64>,
    pub sharpe_ratio: Statistic,
    pub max_drawdown: f64,
    pub profit_factor: Statistic,
    /// Grouped by entry year.
    pub annual: Vec<AnnualSummary>,
    /// Grouped by exit quarter.
    pub quarterly: Vec<QuarterlySummary>,
}

/// Builds the report for one capital model.
///
/// `points[k]` must be the equity point produced for `trades[k]`.
pub fn aggregate(points: &[EquityPoint], trades: &[Trade]) -> PerformanceReport {
    let profits: Vec<f64> = points.iter().map(|p| p.profit).collect();
    let returns: Vec<f64> = points.iter().filter_map(|p| p.period_return).collect();
    let (gross_profit, gross_loss) = gross_totals(&profits);

    PerformanceReport {
        num_trades: points.len(),
        total_profit: profits.iter().sum(),
        gross_profit,
        gross_loss,
        final_equity: points.last().map(|p| p.equity),
        sharpe_ratio: sharpe_ratio(&returns),
        max_drawdown: max_drawdown(points.iter().map(|p| p.equity)),
        profit_factor: profit_factor(&profits),
        annual: annual_breakdown(points, trades),
        quarterly: quarterly_breakdown(points),
    }
}

/// Running peak minus current equity at every point.
pub fn drawdown_series(equity: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity
        .iter()
        .map(|&e| {
            peak = peak.max(e);
            peak - e
        })
        .collect()
}

/// Largest peak-to-current decline, in currency units. Zero for an empty curve.
pub fn max_drawdown<I: IntoIterator<Item = f64>>(equity: I) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for e in equity {
        peak = peak.max(e);
        max_dd = max_dd.max(peak - e);
    }
    max_dd
}

/// Mean over sample standard deviation of per-trade returns.
pub fn sharpe_ratio(returns: &[f64]) -> Statistic {
    if returns.len() < 2 {
        return Statistic::Undefined;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev == 0.0 || !stddev.is_finite() {
        Statistic::Undefined
    } else {
        Statistic::Value(mean / stddev)
    }
}

/// Gross profit over gross loss.
pub fn profit_factor(profits: &[f64]) -> Statistic {
    let (gross_profit, gross_loss) = gross_totals(profits);
    if gross_loss == 0.0 {
        Statistic::Infinite
    } else {
        Statistic::Value(gross_profit / gross_loss)
    }
}

fn gross_totals(profits: &[f64]) -> (f64, f64) {
    let gross_profit: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).sum::<f64>().abs();
    (gross_profit, gross_loss)
}

/// Per entry year: trade count, profit and drawdown of the year's curve
/// re-based to its first equity value.
pub fn annual_breakdown(points: &[EquityPoint], trades: &[Trade]) -> Vec<AnnualSummary> {
    let mut years: BTreeMap<i32, Vec<&EquityPoint>> = BTreeMap::new();
    for (point, trade) in points.iter().zip(trades) {
        years
            .entry(trade.entry_time.year())
            .or_default()
            .push(point);
    }

    years
        .into_iter()
        .map(|(year, group)| {
            let base = group[0].equity;
            AnnualSummary {
                year,
                num_trades: group.len(),
                total_profit: group.iter().map(|p| p.profit).sum(),
                max_drawdown: max_drawdown(group.iter().map(|p| p.equity - base)),
            }
        })
        .collect()
}

/// Per (year, quarter) of the exit time, ascending.
pub fn quarterly_breakdown(points: &[EquityPoint]) -> Vec<QuarterlySummary> {
    let mut quarters: BTreeMap<(i32, u32), Vec<&EquityPoint>> = BTreeMap::new();
    for point in points {
        quarters
            .entry((point.timestamp.year(), quarter_of(point.timestamp.month0())))
            .or_default()
            .push(point);
    }

    quarters
        .into_iter()
        .map(|((year, quarter), mut group)| {
            group.sort_by_key(|p| p.timestamp);
            QuarterlySummary {
                year,
                quarter,
                num_trades: group.len(),
                balance_end: group[group.len() - 1].equity,
                profit: group.iter().map(|p| p.profit).sum(),
                max_drawdown: max_drawdown(group.iter().map(|p| p.equity)),
            }
        })
        .collect()
}

/// Calendar quarter (1-4) of a zero-based month.
pub fn quarter_of(month0: u32) -> u32 {
    month0 / 3 + 1
}
