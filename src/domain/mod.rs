//! Core domain types and logic.

pub mod bar;
pub mod signal;
pub mod exit;
pub mod trade;
pub mod capital;
pub mod metrics;
pub mod backtest;
pub mod universe;
pub mod config_validation;
pub mod error;
