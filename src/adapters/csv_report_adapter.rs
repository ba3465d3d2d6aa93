//! CSV report adapter implementing ReportPort.
//!
//! Every report is rendered to an in-memory buffer first and written in one
//! call, so a failed render never leaves a truncated file behind.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::domain::backtest::ModelRun;
use crate::domain::capital::EquityPoint;
use crate::domain::error::BacktestError;
use crate::domain::metrics::QuarterlySummary;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRADE_COLUMNS: [&str; 8] = [
    "ticker",
    "direction",
    "entry_time",
    "entry_price",
    "exit_time",
    "exit_price",
    "open_macd_diff",
    "profit",
];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn write_file(&self, name: &str, content: &str) -> Result<(), BacktestError> {
        let path = self.output_dir.join(name);
        fs::create_dir_all(&self.output_dir)
            .and_then(|()| fs::write(&path, content))
            .map_err(|e| BacktestError::Write {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(path = %path.display(), "report written");
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_model_report(&self, name: &str, run: &ModelRun) -> Result<(), BacktestError> {
        let content = render_model_report(run).map_err(|e| write_error(name, e))?;
        self.write_file(name, &content)
    }

    fn write_quarterly(&self, name: &str, rows: &[QuarterlySummary]) -> Result<(), BacktestError> {
        let content = render_quarterly(rows).map_err(|e| write_error(name, e))?;
        self.write_file(name, &content)
    }

    fn write_trade_list(&self, name: &str, trades: &[Trade]) -> Result<(), BacktestError> {
        let content = render_trade_list(trades).map_err(|e| write_error(name, e))?;
        self.write_file(name, &content)
    }
}

fn write_error(name: &str, err: impl std::fmt::Display) -> BacktestError {
    BacktestError::Write {
        file: name.to_string(),
        reason: err.to_string(),
    }
}

/// Trade rows followed by `{model}_profit`, `{model}_cum_profit`,
/// `{model}_equity` and `{model}_return`.
pub fn render_model_report(run: &ModelRun) -> Result<String, csv::Error> {
    let prefix = run.model.prefix();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = TRADE_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(
        ["profit", "cum_profit", "equity", "return"]
            .iter()
            .map(|c| format!("{prefix}_{c}")),
    );
    wtr.write_record(&header)?;

    for (trade, point) in run.rows() {
        let mut record = trade_fields(trade);
        record.extend(account_fields(point));
        wtr.write_record(&record)?;
    }

    into_string(wtr)
}

pub fn render_quarterly(rows: &[QuarterlySummary]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "year",
        "quarter",
        "num_trades",
        "balance_end",
        "profit",
        "max_drawdown",
    ])?;
    for q in rows {
        wtr.write_record([
            q.year.to_string(),
            q.quarter.to_string(),
            q.num_trades.to_string(),
            money(q.balance_end),
            money(q.profit),
            money(q.max_drawdown),
        ])?;
    }
    into_string(wtr)
}

pub fn render_trade_list(trades: &[Trade]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "direction",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "profit",
    ])?;
    for t in trades {
        wtr.write_record([
            t.ticker.clone(),
            t.direction.to_string(),
            timestamp(&t.entry_time),
            t.entry_price.to_string(),
            timestamp(&t.exit_time),
            t.exit_price.to_string(),
            money(t.profit),
        ])?;
    }
    into_string(wtr)
}

fn trade_fields(t: &Trade) -> Vec<String> {
    vec![
        t.ticker.clone(),
        t.direction.to_string(),
        timestamp(&t.entry_time),
        t.entry_price.to_string(),
        timestamp(&t.exit_time),
        t.exit_price.to_string(),
        ratio(t.open_macd_diff),
        money(t.profit),
    ]
}

fn account_fields(p: &EquityPoint) -> [String; 4] {
    [
        money(p.profit),
        money(p.cum_profit),
        money(p.equity),
        p.period_return.map(ratio).unwrap_or_default(),
    ]
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String, csv::Error> {
    let data = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(data).map_err(|e| {
        csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

fn timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Two decimals; negative zero prints as `0.00`.
fn money(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

/// Four decimals; NaN becomes an empty cell.
fn ratio(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:.4}", value)
    }
}
