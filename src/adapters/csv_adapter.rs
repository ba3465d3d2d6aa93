//! CSV directory data adapter.
//!
//! Each `<TICKER>.csv` in the base directory holds one series. Columns are
//! located by header name; extra columns are ignored.

use crate::domain::bar::{Bar, Series};
use crate::domain::error::BacktestError;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "close", "RSI", "MACD_Diff", "can_trade"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

impl DataPort for CsvAdapter {
    fn list_tickers(&self) -> Result<Vec<String>, BacktestError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktestError::Read {
            file: self.base_path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BacktestError::Read {
                file: self.base_path.display().to_string(),
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }

    fn load_series(&self, ticker: &str) -> Result<Series, BacktestError> {
        let path = self.csv_path(ticker);
        let file = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| BacktestError::Read {
            file: file.clone(),
            reason: e.to_string(),
        })?;

        let bars = parse_bars(&content, &file)?;
        Ok(Series::new(ticker, bars))
    }
}

/// Parses CSV text into bars, in file order.
pub fn parse_bars(content: &str, file: &str) -> Result<Vec<Bar>, BacktestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| BacktestError::Read {
            file: file.to_string(),
            reason: format!("CSV header error: {}", e),
        })?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|&name| column(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(BacktestError::MissingColumns {
            file: file.to_string(),
            columns: missing.join(", "),
        });
    }
    let [ts_idx, close_idx, rsi_idx, macd_idx, trade_idx] =
        REQUIRED_COLUMNS.map(|name| column(name).unwrap_or_default());

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| BacktestError::Read {
            file: file.to_string(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let parse_err = |reason: String| BacktestError::Parse {
            file: file.to_string(),
            line,
            reason,
        };

        let ts_str = record.get(ts_idx).unwrap_or_default();
        let timestamp = parse_timestamp(ts_str)
            .ok_or_else(|| parse_err(format!("invalid timestamp: {:?}", ts_str)))?;

        let close: f64 = record
            .get(close_idx)
            .unwrap_or_default()
            .parse()
            .map_err(|e| parse_err(format!("invalid close value: {}", e)))?;

        let rsi = parse_indicator(record.get(rsi_idx).unwrap_or_default())
            .map_err(|e| parse_err(format!("invalid RSI value: {}", e)))?;
        let macd_diff = parse_indicator(record.get(macd_idx).unwrap_or_default())
            .map_err(|e| parse_err(format!("invalid MACD_Diff value: {}", e)))?;
        let can_trade = parse_flag(record.get(trade_idx).unwrap_or_default())
            .map_err(|e| parse_err(format!("invalid can_trade value: {}", e)))?;

        bars.push(Bar {
            timestamp,
            close,
            rsi,
            macd_diff,
            can_trade,
        });
    }

    Ok(bars)
}

/// Parses a timestamp, keeping the wall-clock time of an explicit offset.
///
/// Calendar dates, years and quarters are taken from that local time.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][+HH:MM]`,
/// `YYYY-MM-DDTHH:MM:SS[.f]` and bare `YYYY-MM-DD`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Empty cells and NaN mark an undefined (warm-up) indicator.
fn parse_indicator(value: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed: f64 = value.parse()?;
    Ok(Some(parsed).filter(|v| !v.is_nan()))
}

/// Tradable only when the cell is exactly 1.
fn parse_flag(value: &str) -> Result<bool, std::num::ParseFloatError> {
    if value.is_empty() {
        return Ok(false);
    }
    let parsed: f64 = value.parse()?;
    Ok(parsed == 1.0)
}
