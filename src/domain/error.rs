//! Domain error types.

/// Top-level error type for rsimacd.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("{file}: missing required columns: {columns}")]
    MissingColumns { file: String, columns: String },

    #[error("failed to read {file}: {reason}")]
    Read { file: String, reason: String },

    #[error("{file}, line {line}: {reason}")]
    Parse {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("failed to write {file}: {reason}")]
    Write { file: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no usable series in {dir}")]
    NoData { dir: String },

    #[error("no trades found across {series} series")]
    NoTrades { series: usize },
}

impl BacktestError {
    /// True for failures that are isolated to a single source file.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            BacktestError::MissingColumns { .. }
                | BacktestError::Read { .. }
                | BacktestError::Parse { .. }
        )
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        let code: u8 = match err {
            BacktestError::Read { .. }
            | BacktestError::Parse { .. }
            | BacktestError::MissingColumns { .. }
            | BacktestError::Write { .. } => 1,
            BacktestError::ConfigParse { .. } | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::NoData { .. } => 5,
            BacktestError::NoTrades { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
