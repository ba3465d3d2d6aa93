//! Loading the ticker universe with per-file isolation.
//!
//! Every source is loaded independently. A file that lacks required columns
//! or fails to parse is recorded as skipped and the batch continues with the
//! remaining tickers.

use crate::domain::bar::Series;
use crate::domain::error::BacktestError;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Required columns are absent.
    Schema(String),
    /// The file could not be read or parsed.
    Io(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub ticker: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct UniverseLoad {
    pub series: Vec<Series>,
    pub skipped: Vec<SkippedFile>,
}

impl UniverseLoad {
    pub fn loaded_count(&self) -> usize {
        self.series.len()
    }
}

/// Loads every ticker the port lists, in listing order.
///
/// Failures confined to one file are recorded and skipped. Anything else,
/// including a failure to list the source, aborts the load.
pub fn load_universe(data_port: &dyn DataPort) -> Result<UniverseLoad, BacktestError> {
    let tickers = data_port.list_tickers()?;
    let mut load = UniverseLoad::default();

    for ticker in tickers {
        match data_port.load_series(&ticker) {
            Ok(series) => {
                tracing::debug!(ticker = %ticker, bars = series.len(), "loaded series");
                load.series.push(series);
            }
            Err(err) if !err.is_per_file() => return Err(err),
            Err(err) => {
                let reason = match &err {
                    BacktestError::MissingColumns { .. } => SkipReason::Schema(err.to_string()),
                    _ => SkipReason::Io(err.to_string()),
                };
                tracing::warn!(ticker = %ticker, "skipping: {err}");
                load.skipped.push(SkippedFile { ticker, reason });
            }
        }
    }

    Ok(load)
}
