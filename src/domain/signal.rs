//! Entry signal detection over a sliding five-bar window.
//!
//! A BUY fires when RSI rises strictly across the window while MACD_Diff
//! flips from negative (first four bars) to positive (current bar). SELL is
//! the mirror image. Only the current bar has to be flagged `can_trade`.

use std::fmt;
use std::iter::Enumerate;
use std::slice::Windows;

use super::bar::{Bar, Series};

/// Bars in the lookback window, current bar last.
pub const WINDOW_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }

    /// Whether a move from `prev` to `curr` is in the trade's favor.
    pub fn is_favorable(&self, prev: f64, curr: f64) -> bool {
        match self {
            Direction::Buy => curr > prev,
            Direction::Sell => curr < prev,
        }
    }

    /// Per-unit profit of a round trip.
    pub fn profit(&self, entry_price: f64, exit_price: f64) -> f64 {
        match self {
            Direction::Buy => exit_price - entry_price,
            Direction::Sell => entry_price - exit_price,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate entry at `index` of the scanned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub index: usize,
    pub direction: Direction,
}

/// Lazily scans `series` for entry signals.
///
/// The iterator borrows the series; calling `scan` again yields the same
/// sequence. A series with fewer than [`WINDOW_LEN`] eligible bars yields
/// nothing.
pub fn scan(series: &Series) -> Scanner<'_> {
    let bars: &[Bar] = if series.eligible_count() < WINDOW_LEN {
        &[]
    } else {
        series.bars()
    };
    Scanner {
        windows: bars.windows(WINDOW_LEN).enumerate(),
        pending: None,
    }
}

pub struct Scanner<'a> {
    windows: Enumerate<Windows<'a, Bar>>,
    pending: Option<Signal>,
}

impl Iterator for Scanner<'_> {
    type Item = Signal;

    fn next(&mut self) -> Option<Signal> {
        if let Some(signal) = self.pending.take() {
            return Some(signal);
        }
        for (offset, window) in self.windows.by_ref() {
            let index = offset + WINDOW_LEN - 1;
            if !window[WINDOW_LEN - 1].can_trade {
                continue;
            }
            let buy = is_entry(window, Direction::Buy);
            let sell = is_entry(window, Direction::Sell);
            match (buy, sell) {
                (true, true) => {
                    self.pending = Some(Signal {
                        index,
                        direction: Direction::Sell,
                    });
                    return Some(Signal {
                        index,
                        direction: Direction::Buy,
                    });
                }
                (true, false) => {
                    return Some(Signal {
                        index,
                        direction: Direction::Buy,
                    });
                }
                (false, true) => {
                    return Some(Signal {
                        index,
                        direction: Direction::Sell,
                    });
                }
                (false, false) => {}
            }
        }
        None
    }
}

/// Checks the entry condition for `direction` on a full window.
pub fn is_entry(window: &[Bar], direction: Direction) -> bool {
    if window.len() != WINDOW_LEN {
        return false;
    }
    let Some(rsi) = window.iter().map(|b| b.rsi).collect::<Option<Vec<f64>>>() else {
        return false;
    };
    let Some(macd) = window
        .iter()
        .map(|b| b.macd_diff)
        .collect::<Option<Vec<f64>>>()
    else {
        return false;
    };
    let (history, current) = macd.split_at(WINDOW_LEN - 1);
    let current = current[0];

    match direction {
        Direction::Buy => {
            rsi.windows(2).all(|w| w[0] < w[1])
                && current > 0.0
                && history.iter().all(|&m| m < 0.0)
        }
        Direction::Sell => {
            rsi.windows(2).all(|w| w[0] > w[1])
                && current < 0.0
                && history.iter().all(|&m| m > 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 9)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn make_series(rsi: &[f64], macd: &[f64]) -> Series {
        let bars = rsi
            .iter()
            .zip(macd)
            .enumerate()
            .map(|(i, (&r, &m))| Bar {
                timestamp: start() + Duration::hours(4 * i as i64),
                close: 100.0 + i as f64,
                rsi: Some(r),
                macd_diff: Some(m),
                can_trade: true,
            })
            .collect();
        Series::new("SBER", bars)
    }

    #[test]
    fn reference_scenario_yields_single_buy() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1, 0.5, -0.3, 0.2, 0.4, 0.6],
        );
        let signals: Vec<Signal> = scan(&series).collect();
        assert_eq!(
            signals,
            vec![Signal {
                index: 4,
                direction: Direction::Buy
            }]
        );
    }

    #[test]
    fn sell_mirrors_buy() {
        let series = make_series(
            &[70.0, 65.0, 60.0, 55.0, 50.0],
            &[2.0, 1.5, 1.0, 0.5, -0.1],
        );
        let signals: Vec<Signal> = scan(&series).collect();
        assert_eq!(
            signals,
            vec![Signal {
                index: 4,
                direction: Direction::Sell
            }]
        );
    }

    #[test]
    fn rsi_must_rise_at_every_step() {
        // Every prior value is below the current one, but 40 -> 38 breaks the run.
        let series = make_series(
            &[30.0, 40.0, 38.0, 45.0, 50.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1],
        );
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn flat_rsi_is_not_strict() {
        let series = make_series(
            &[30.0, 35.0, 35.0, 45.0, 50.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1],
        );
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn zero_macd_blocks_crossover() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0],
            &[-2.0, -1.5, 0.0, -0.5, 0.1],
        );
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn untradable_bar_is_skipped() {
        let mut series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1],
        );
        let mut bars = series.bars().to_vec();
        bars[4].can_trade = false;
        series = Series::new("SBER", bars);
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn only_current_bar_needs_can_trade() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1],
        );
        let mut bars = series.bars().to_vec();
        bars[0].can_trade = false;
        bars[2].can_trade = false;
        let series = Series::new("SBER", bars);
        assert_eq!(scan(&series).count(), 1);
    }

    #[test]
    fn warm_up_bars_never_signal() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1],
        );
        let mut bars = series.bars().to_vec();
        bars[0].rsi = None;
        let series = Series::new("SBER", bars);
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn short_series_yields_nothing() {
        let series = make_series(&[30.0, 35.0, 40.0, 45.0], &[-2.0, -1.5, -1.0, 0.5]);
        assert_eq!(scan(&series).count(), 0);
        assert_eq!(scan(&Series::new("EMPTY", vec![])).count(), 0);
    }

    #[test]
    fn only_signal_bar_needs_to_be_tradable() {
        let mut series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1, 0.5, -0.3, 0.2, 0.4, 0.6],
        );
        let bars = series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, b)| Bar {
                can_trade: i == 4,
                ..b.clone()
            })
            .collect();
        series = Series::new("SBER", bars);
        assert_eq!(series.eligible_count(), 10);
        assert_eq!(scan(&series).count(), 1);
    }

    #[test]
    fn too_few_warm_bars_yield_nothing() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0, 55.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1, 0.5],
        );
        let bars = series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, b)| Bar {
                rsi: if i < 2 { None } else { b.rsi },
                ..b.clone()
            })
            .collect();
        let series = Series::new("SBER", bars);
        assert_eq!(series.len(), 6);
        assert_eq!(series.eligible_count(), 4);
        assert_eq!(scan(&series).count(), 0);
    }

    #[test]
    fn rescanning_rematerializes_sequence() {
        let series = make_series(
            &[30.0, 35.0, 40.0, 45.0, 50.0, 45.0, 40.0, 35.0, 30.0, 25.0],
            &[-2.0, -1.5, -1.0, -0.5, 0.1, 0.2, 0.3, 0.4, 0.5, -0.1],
        );
        let first: Vec<Signal> = scan(&series).collect();
        let second: Vec<Signal> = scan(&series).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].direction, Direction::Buy);
        assert_eq!(first[1].direction, Direction::Sell);
        assert_eq!(first[1].index, 9);
    }

    #[test]
    fn direction_helpers() {
        assert!(Direction::Buy.is_favorable(1.0, 2.0));
        assert!(!Direction::Buy.is_favorable(2.0, 2.0));
        assert!(Direction::Sell.is_favorable(2.0, 1.0));
        assert_eq!(Direction::Buy.profit(100.0, 103.0), 3.0);
        assert_eq!(Direction::Sell.profit(100.0, 103.0), -3.0);
        assert_eq!(Direction::Sell.to_string(), "SELL");
    }
}
