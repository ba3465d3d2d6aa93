//! Account-level accounting of single-contract trades.
//!
//! Contract count per trade is `floor(available / (entry_price / ratio))`.
//! Under [`CapitalModel::Fixed`] the available capital is always the initial
//! capital; under [`CapitalModel::Reinvest`] it is the running balance after
//! every earlier trade in entry order.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::trade::{Trade, TradeLedger};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 500_000.0;
pub const DEFAULT_COLLATERAL_RATIO: f64 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapitalModel {
    Fixed,
    Reinvest,
}

impl CapitalModel {
    /// Column prefix used in trade reports.
    pub fn prefix(&self) -> &'static str {
        match self {
            CapitalModel::Fixed => "fixed",
            CapitalModel::Reinvest => "reinvest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalConfig {
    pub initial_capital: f64,
    pub collateral_ratio: f64,
}

impl Default for CapitalConfig {
    fn default() -> Self {
        CapitalConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            collateral_ratio: DEFAULT_COLLATERAL_RATIO,
        }
    }
}

impl CapitalConfig {
    pub fn with_capital(initial_capital: f64) -> Self {
        CapitalConfig {
            initial_capital,
            ..Self::default()
        }
    }
}

/// Account state after one trade.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    /// Exit time of the trade.
    pub timestamp: NaiveDateTime,
    pub contracts: i64,
    /// Account-level P&L of the trade.
    pub profit: f64,
    pub cum_profit: f64,
    pub equity: f64,
    /// Percentage change from the previous point; `None` for the first.
    pub period_return: Option<f64>,
}

/// Whole contracts affordable with `available_capital` at `entry_price`.
///
/// Negative capital gives a negative count. Returns 0 when price or ratio is
/// not positive.
pub fn contracts_for(available_capital: f64, entry_price: f64, collateral_ratio: f64) -> i64 {
    if entry_price <= 0.0 || collateral_ratio <= 0.0 {
        return 0;
    }
    let collateral_per_unit = entry_price / collateral_ratio;
    (available_capital / collateral_per_unit).floor() as i64
}

pub fn apply_fixed_model(ledger: &TradeLedger, initial_capital: f64) -> Vec<EquityPoint> {
    apply_model(
        ledger,
        CapitalModel::Fixed,
        &CapitalConfig::with_capital(initial_capital),
    )
}

pub fn apply_reinvest_model(ledger: &TradeLedger, initial_capital: f64) -> Vec<EquityPoint> {
    apply_model(
        ledger,
        CapitalModel::Reinvest,
        &CapitalConfig::with_capital(initial_capital),
    )
}

/// Replays the ledger in entry order under `model`, one point per trade.
pub fn apply_model(
    ledger: &TradeLedger,
    model: CapitalModel,
    config: &CapitalConfig,
) -> Vec<EquityPoint> {
    let mut points: Vec<EquityPoint> = Vec::with_capacity(ledger.len());
    let mut cum_profit = 0.0_f64;
    let mut balance = config.initial_capital;

    for trade in ledger {
        let available = match model {
            CapitalModel::Fixed => config.initial_capital,
            CapitalModel::Reinvest => balance,
        };
        let contracts = contracts_for(available, trade.entry_price, config.collateral_ratio);
        let profit = contracts as f64 * trade.profit_per_unit();
        cum_profit += profit;

        let equity = match model {
            CapitalModel::Fixed => config.initial_capital + cum_profit,
            CapitalModel::Reinvest => {
                balance += profit;
                balance
            }
        };

        let period_return = points.last().and_then(|prev| pct_change(prev.equity, equity));

        points.push(EquityPoint {
            timestamp: trade.exit_time,
            contracts,
            profit,
            cum_profit,
            equity,
            period_return,
        });
    }

    points
}

/// `(curr - prev) / prev`, undefined when `prev` is zero.
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev)
    }
}

/// Keeps one trade per calendar entry date.
///
/// Within a date the preferred trade is chosen by [`ticker_preference`];
/// trades with equal keys resolve to the earliest entry. The result is
/// re-sorted by entry time, so running this on its own output is a no-op.
pub fn dedup_by_entry_date(ledger: &TradeLedger) -> TradeLedger {
    let kept: Vec<Trade> = ledger
        .trades()
        .chunk_by(|a, b| a.entry_time.date() == b.entry_time.date())
        .filter_map(|day| {
            day.iter()
                .min_by(|a, b| ticker_preference(&a.ticker, &b.ticker))
                .cloned()
        })
        .collect();
    TradeLedger::from_trades(kept)
}

/// Orders tickers so the preferred one compares `Less`.
///
/// Tickers parsing as numbers rank first, highest value first. Non-numeric
/// tickers follow. Remaining ties fall back to descending lexicographic
/// order. For mixed alphanumeric ticker sets this is a quirk rather than a
/// meaningful ranking, and it is kept as is.
pub fn ticker_preference(a: &str, b: &str) -> Ordering {
    let numeric = match (numeric_ticker(a), numeric_ticker(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    numeric.then_with(|| b.cmp(a))
}

fn numeric_ticker(ticker: &str) -> Option<f64> {
    ticker
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
}
