//! Forward exit simulation for a detected signal.
//!
//! Starting at the signal bar, the simulator walks at most `max_wait` bars.
//! It takes profit after `tick_threshold` consecutive favorable closes, stops
//! out when MACD_Diff moves against the position relative to its value at
//! entry, and otherwise exits on the last bar of the horizon.

use super::bar::Series;
use super::signal::{Direction, Signal};
use super::trade::Trade;

pub const DEFAULT_TICK_THRESHOLD: usize = 2;
pub const DEFAULT_MAX_WAIT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPolicy {
    pub tick_threshold: usize,
    pub max_wait: usize,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        ExitPolicy {
            tick_threshold: DEFAULT_TICK_THRESHOLD,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `tick_threshold` consecutive favorable closes.
    TakeProfit,
    /// MACD_Diff crossed back past its value at entry.
    MacdReversal,
    /// Horizon exhausted, including the zero-length horizon at the series end.
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub index: usize,
    pub reason: ExitReason,
}

/// Finds the exit bar for `signal`.
///
/// The returned index always lies in `signal.index ..= signal.index + max_wait`.
pub fn simulate_exit(series: &Series, signal: &Signal, policy: &ExitPolicy) -> Exit {
    let bars = series.bars();
    let start = signal.index;
    let horizon = policy
        .max_wait
        .min(bars.len().saturating_sub(start + 1));
    let open_macd_diff = bars[start].macd_diff;
    let direction = signal.direction;

    let mut favorable_ticks = 0usize;
    for i in start + 1..=start + horizon {
        if direction.is_favorable(bars[i - 1].close, bars[i].close) {
            favorable_ticks += 1;
        } else {
            favorable_ticks = 0;
        }

        if favorable_ticks >= policy.tick_threshold {
            return Exit {
                index: i,
                reason: ExitReason::TakeProfit,
            };
        }

        if let (Some(open), Some(current)) = (open_macd_diff, bars[i].macd_diff) {
            let reversed = match direction {
                Direction::Buy => current < open,
                Direction::Sell => current > open,
            };
            if reversed {
                return Exit {
                    index: i,
                    reason: ExitReason::MacdReversal,
                };
            }
        }
    }

    Exit {
        index: start + horizon,
        reason: ExitReason::Timeout,
    }
}

/// Resolves `signal` into a closed single-contract trade.
pub fn resolve(series: &Series, signal: &Signal, policy: &ExitPolicy) -> Trade {
    let exit = simulate_exit(series, signal, policy);
    let entry_bar = &series.bars()[signal.index];
    let exit_bar = &series.bars()[exit.index];

    Trade {
        ticker: series.ticker.clone(),
        direction: signal.direction,
        entry_time: entry_bar.timestamp,
        entry_price: entry_bar.close,
        exit_time: exit_bar.timestamp,
        exit_price: exit_bar.close,
        open_macd_diff: entry_bar.macd_diff.unwrap_or(f64::NAN),
        profit: signal.direction.profit(entry_bar.close, exit_bar.close),
    }
}
