#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rsimacd::domain::backtest::ModelRun;
pub use rsimacd::domain::bar::{Bar, Series};
use rsimacd::domain::error::BacktestError;
use rsimacd::domain::metrics::QuarterlySummary;
use rsimacd::domain::trade::Trade;
use rsimacd::ports::data_port::DataPort;
use rsimacd::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum MockFailure {
    MissingColumns(String),
    Read(String),
}

pub struct MockDataPort {
    pub data: BTreeMap<String, Vec<Bar>>,
    pub errors: BTreeMap<String, MockFailure>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_series(self, series: Series) -> Self {
        let ticker = series.ticker.clone();
        self.with_bars(&ticker, series.bars().to_vec())
    }

    pub fn with_missing_columns(mut self, ticker: &str, columns: &str) -> Self {
        self.errors
            .insert(ticker.to_string(), MockFailure::MissingColumns(columns.to_string()));
        self
    }

    pub fn with_read_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors
            .insert(ticker.to_string(), MockFailure::Read(reason.to_string()));
        self
    }
}

impl DataPort for MockDataPort {
    fn list_tickers(&self) -> Result<Vec<String>, BacktestError> {
        let mut tickers: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        tickers.sort();
        tickers.dedup();
        Ok(tickers)
    }

    fn load_series(&self, ticker: &str) -> Result<Series, BacktestError> {
        if let Some(failure) = self.errors.get(ticker) {
            let file = format!("{ticker}.csv");
            return Err(match failure {
                MockFailure::MissingColumns(columns) => BacktestError::MissingColumns {
                    file,
                    columns: columns.clone(),
                },
                MockFailure::Read(reason) => BacktestError::Read {
                    file,
                    reason: reason.clone(),
                },
            });
        }
        Ok(Series::new(
            ticker,
            self.data.get(ticker).cloned().unwrap_or_default(),
        ))
    }
}

/// A report call captured by [`MockReportPort`].
#[derive(Debug, Clone)]
pub enum ReportCall {
    Model { name: String, run: ModelRun },
    Quarterly { name: String, rows: Vec<QuarterlySummary> },
    TradeList { name: String, trades: Vec<Trade> },
}

impl ReportCall {
    pub fn name(&self) -> &str {
        match self {
            ReportCall::Model { name, .. }
            | ReportCall::Quarterly { name, .. }
            | ReportCall::TradeList { name, .. } => name,
        }
    }
}

pub struct MockReportPort {
    pub calls: RefCell<Vec<ReportCall>>,
    pub fail_on: Option<String>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_on: Some(name.to_string()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    fn record(&self, call: ReportCall) -> Result<(), BacktestError> {
        if self.fail_on.as_deref() == Some(call.name()) {
            return Err(BacktestError::Write {
                file: call.name().to_string(),
                reason: "disk full".into(),
            });
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl ReportPort for MockReportPort {
    fn write_model_report(&self, name: &str, run: &ModelRun) -> Result<(), BacktestError> {
        self.record(ReportCall::Model {
            name: name.to_string(),
            run: run.clone(),
        })
    }

    fn write_quarterly(&self, name: &str, rows: &[QuarterlySummary]) -> Result<(), BacktestError> {
        self.record(ReportCall::Quarterly {
            name: name.to_string(),
            rows: rows.to_vec(),
        })
    }

    fn write_trade_list(&self, name: &str, trades: &[Trade]) -> Result<(), BacktestError> {
        self.record(ReportCall::TradeList {
            name: name.to_string(),
            trades: trades.to_vec(),
        })
    }
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub fn make_bar(timestamp: NaiveDateTime, close: f64, rsi: f64, macd: f64) -> Bar {
    Bar {
        timestamp,
        close,
        rsi: Some(rsi),
        macd_diff: Some(macd),
        can_trade: true,
    }
}

/// Ten 4-hour bars: BUY at index 4 (close `base + 4`), take-profit at 6.
pub fn buy_series(ticker: &str, start: NaiveDateTime, base: f64) -> Series {
    let rsi = [30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0];
    let macd = [-2.0, -1.5, -1.0, -0.5, 0.1, 0.5, -0.3, 0.2, 0.4, 0.6];
    let bars = (0..10)
        .map(|i| {
            make_bar(
                start + Duration::hours(4 * i as i64),
                base + i as f64,
                rsi[i],
                macd[i],
            )
        })
        .collect();
    Series::new(ticker, bars)
}

/// Mirror of [`buy_series`]: SELL at index 4, take-profit at 6.
pub fn sell_series(ticker: &str, start: NaiveDateTime, base: f64) -> Series {
    let rsi = [70.0, 65.0, 60.0, 55.0, 50.0, 45.0, 40.0, 35.0, 30.0, 25.0];
    let macd = [2.0, 1.5, 1.0, 0.5, -0.1, -0.5, 0.3, -0.2, -0.4, -0.6];
    let bars = (0..10)
        .map(|i| {
            make_bar(
                start + Duration::hours(4 * i as i64),
                base - i as f64,
                rsi[i],
                macd[i],
            )
        })
        .collect();
    Series::new(ticker, bars)
}

/// Ten bars that never produce a signal.
pub fn flat_series(ticker: &str, start: NaiveDateTime) -> Series {
    let bars = (0..10)
        .map(|i| make_bar(start + Duration::hours(4 * i as i64), 100.0, 50.0, 0.0))
        .collect();
    Series::new(ticker, bars)
}

/// CSV text for a series in the input file layout.
pub fn series_csv(series: &Series) -> String {
    let mut out = String::from("timestamp,open,close,RSI,MACD_Diff,can_trade\n");
    for bar in series.bars() {
        let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.close,
            bar.close,
            cell(bar.rsi),
            cell(bar.macd_diff),
            u8::from(bar.can_trade),
        ));
    }
    out
}
