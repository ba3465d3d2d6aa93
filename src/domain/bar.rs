//! Indicator-annotated bars and per-ticker series.

use chrono::NaiveDateTime;

/// One observation of an instrument with precomputed indicators.
///
/// `rsi` and `macd_diff` are `None` during the indicator warm-up window.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd_diff: Option<f64>,
    pub can_trade: bool,
}

impl Bar {
    /// Both indicators are defined.
    pub fn is_warm(&self) -> bool {
        self.rsi.is_some() && self.macd_diff.is_some()
    }
}

/// Timestamp-ordered bars for a single ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub ticker: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Builds a series, stable-sorting the bars by timestamp.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars past the indicator warm-up, i.e. with both indicators defined.
    /// Tradability is a property of the signal bar alone and is not counted.
    pub fn eligible_count(&self) -> usize {
        self.bars.iter().filter(|b| b.is_warm()).count()
    }
}
